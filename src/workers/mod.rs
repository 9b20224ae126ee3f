pub mod common;
pub mod extraction;
pub mod worker_loop;

// Common re-exports
pub use common::{partition_ids, ExtractionStats};
pub use extraction::{process_ngrams, process_record, Pass, RecordOutcome, SkipReason};
pub use worker_loop::{extraction_loop, run_workers};
