use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;

/// Ids in `(start, end]` owned by `worker` out of `workers`: those with `id % workers == worker`.
///
/// Every id in the range belongs to exactly one worker for any worker count.
pub fn partition_ids(start: i64, end: i64, worker: usize, workers: usize) -> impl Iterator<Item = i64> {
    let workers = workers.max(1) as i64;
    let worker = worker as i64 % workers;
    let first_candidate = start.saturating_add(1);
    let offset = (worker - first_candidate.rem_euclid(workers)).rem_euclid(workers);

    (first_candidate.saturating_add(offset)..=end).step_by(workers as usize)
}

/// Counters reported by each worker and summed for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub classified: u64,
    /// Entities typed by the n-gram pass.
    pub ngram_classified: u64,
}

impl AddAssign for ExtractionStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.classified += other.classified;
        self.ngram_classified += other.ngram_classified;
    }
}

impl fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} skipped={} failed={} classified={} ngram_classified={}",
            self.processed, self.skipped, self.failed, self.classified, self.ngram_classified
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partition_covers_every_id_exactly_once() {
        for workers in 1..=7 {
            let mut seen: HashMap<i64, usize> = HashMap::new();
            for worker in 0..workers {
                for id in partition_ids(3, 50, worker, workers) {
                    assert_eq!(id as usize % workers, worker);
                    *seen.entry(id).or_default() += 1;
                }
            }
            assert_eq!(seen.len(), 47, "workers={}", workers);
            assert!(seen.values().all(|count| *count == 1));
            assert!(!seen.contains_key(&3));
            assert!(seen.contains_key(&50));
        }
    }

    #[test]
    fn test_partition_of_empty_range() {
        assert_eq!(partition_ids(10, 10, 0, 4).count(), 0);
        assert_eq!(partition_ids(10, 5, 1, 4).count(), 0);
    }

    #[test]
    fn test_partition_strides() {
        let ids: Vec<i64> = partition_ids(0, 12, 2, 4).collect();
        assert_eq!(ids, vec![2, 6, 10]);
        let ids: Vec<i64> = partition_ids(0, 12, 0, 4).collect();
        assert_eq!(ids, vec![4, 8, 12]);
    }

    #[test]
    fn test_stats_sum() {
        let mut total = ExtractionStats::default();
        total += ExtractionStats { processed: 2, skipped: 1, failed: 0, classified: 5, ngram_classified: 0 };
        total += ExtractionStats { processed: 1, skipped: 0, failed: 1, classified: 2, ngram_classified: 4 };
        assert_eq!(total.processed, 3);
        assert_eq!(total.classified, 7);
        assert_eq!(
            total.to_string(),
            "processed=3 skipped=1 failed=1 classified=7 ngram_classified=4"
        );
    }
}
