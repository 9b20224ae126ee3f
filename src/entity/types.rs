use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of votes a type needs before a category pass may stop early.
pub const TYPE_THRESHOLD: u32 = 3;

/// Coarse named-entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Misc,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Misc,
    ];

    /// Maps a taxonomy label to its coarse type. Labels outside the known set are lumped into MISC.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "PERSON" | "PER" => EntityType::Person,
            "ORGANIZATION" | "ORGANISATION" | "ORG" => EntityType::Organization,
            "GPE" | "FACILITY" | "LOCATION" | "LOC" => EntityType::Location,
            _ => EntityType::Misc,
        }
    }

    /// Short tag as stored in the cache, the database and inline annotations.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityType::Person => "PER",
            EntityType::Organization => "ORG",
            EntityType::Location => "LOC",
            EntityType::Misc => "MISC",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        EntityType::from_label(s)
    }
}

/// Running vote counts for the four coarse types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTally {
    pub person: u32,
    pub organization: u32,
    pub location: u32,
    pub misc: u32,
}

impl TypeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote(&mut self, entity_type: EntityType) {
        match entity_type {
            EntityType::Person => self.person += 1,
            EntityType::Organization => self.organization += 1,
            EntityType::Location => self.location += 1,
            EntityType::Misc => self.misc += 1,
        }
    }

    pub fn count(&self, entity_type: EntityType) -> u32 {
        match entity_type {
            EntityType::Person => self.person,
            EntityType::Organization => self.organization,
            EntityType::Location => self.location,
            EntityType::Misc => self.misc,
        }
    }

    pub fn total(&self) -> u32 {
        self.person + self.organization + self.location + self.misc
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The type whose count is strictly greater than every other count. Ties never decide.
    pub fn leader(&self) -> Option<EntityType> {
        EntityType::ALL.into_iter().find(|candidate| {
            let votes = self.count(*candidate);
            EntityType::ALL
                .iter()
                .filter(|other| *other != candidate)
                .all(|other| votes > self.count(*other))
        })
    }

    /// Like [`TypeTally::leader`], but only once the leader has at least `threshold` votes.
    pub fn decisive(&self, threshold: u32) -> Option<EntityType> {
        self.leader()
            .filter(|leader| self.count(*leader) >= threshold)
    }
}

impl fmt::Display for TypeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PER={}, ORG={}, LOC={}, MISC={}",
            self.person, self.organization, self.location, self.misc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(EntityType::from_label("PERSON"), EntityType::Person);
        assert_eq!(EntityType::from_label("organization"), EntityType::Organization);
        assert_eq!(EntityType::from_label("GPE"), EntityType::Location);
        assert_eq!(EntityType::from_label("FACILITY"), EntityType::Location);
        assert_eq!(EntityType::from_label("WORK_OF_ART"), EntityType::Misc);

        // Short tags round-trip through the same parser
        for entity_type in EntityType::ALL {
            assert_eq!(EntityType::from(entity_type.tag()), entity_type);
        }
    }

    #[test]
    fn test_leader_requires_strict_majority() {
        let mut tally = TypeTally::new();
        assert_eq!(tally.leader(), None);

        tally.vote(EntityType::Person);
        tally.vote(EntityType::Person);
        tally.vote(EntityType::Organization);
        tally.vote(EntityType::Organization);
        assert_eq!(tally.leader(), None);

        tally.vote(EntityType::Organization);
        assert_eq!(tally.leader(), Some(EntityType::Organization));
    }

    #[test]
    fn test_decisive_is_threshold_gated() {
        let mut tally = TypeTally::new();
        tally.vote(EntityType::Location);
        tally.vote(EntityType::Location);
        assert_eq!(tally.leader(), Some(EntityType::Location));
        assert_eq!(tally.decisive(TYPE_THRESHOLD), None);

        tally.vote(EntityType::Location);
        assert_eq!(tally.decisive(TYPE_THRESHOLD), Some(EntityType::Location));

        tally.vote(EntityType::Misc);
        tally.vote(EntityType::Misc);
        tally.vote(EntityType::Misc);
        assert_eq!(tally.decisive(TYPE_THRESHOLD), None);
        assert_eq!(tally.total(), 6);
    }
}
