mod config;
mod policy;
mod skills;

pub use config::{ReputationTier, ScoringConfig};
pub use policy::{Lenient, Strict};
pub use skills::{skills_match, teaches_any};

use serde::{Deserialize, Serialize};

use super::domain::Profile;

/// How the ranking engine gathers profiles to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStrategy {
    /// Every public, finalized profile.
    AllPublic,
    /// One query per wanted skill for profiles teaching it.
    TeachersOfWantedSkills,
}

/// A named way of scoring a requester against a candidate.
pub trait ScoringPolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    fn pool_strategy(&self) -> PoolStrategy;

    /// Whether candidates must score strictly above zero to be kept.
    fn enforces_floor(&self) -> bool;

    /// Order-independent part of the score.
    fn compatibility(&self, a: &Profile, b: &Profile) -> i64;

    /// Full score of `candidate` as seen by `requester`.
    fn score(&self, requester: &Profile, candidate: &Profile) -> i64;

    /// Human-readable explanation; only facts that contributed are mentioned.
    fn reason(&self, requester: &Profile, candidate: &Profile) -> String;

    fn admits(&self, score: i64) -> bool {
        !self.enforces_floor() || score > 0
    }
}

/// Caller-facing selector for a scoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Strict,
    Lenient,
}

impl PolicyKind {
    pub fn build(self, config: &ScoringConfig) -> Box<dyn ScoringPolicy> {
        match self {
            PolicyKind::Strict => Box::new(Strict::new(config.clone())),
            PolicyKind::Lenient => Box::new(Lenient::new(config.clone())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PolicyKind::Strict => "strict",
            PolicyKind::Lenient => "lenient",
        }
    }
}
