//! Skill-exchange matchmaking: compatibility scoring, candidate ranking, the
//! accept/reject state machine, and the sample fallback shown to empty feeds.

pub mod connections;
pub mod domain;
pub mod ranking;
pub mod repository;
pub mod reputation;
pub mod router;
pub mod samples;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use connections::{
    ConnectionError, ConnectionOutcome, ConnectionService, ConnectionTarget, MutualCheck,
};
pub use domain::{
    Availability, CandidateSource, ChannelId, ConnectionDecision, Day, Decision, ExperienceLevel,
    HonorRating, MatchCandidate, MutualMatch, MutualMatchStatus, PairKey, Profile, TimeSlot,
    ProfileError, UserId, Visibility, MAX_HONOR_SCORE, SAMPLE_ID_PREFIX,
};
pub use ranking::{MatchRankingEngine, MatchingError};
pub use repository::{
    ChatProvisioner, DecisionStore, MatchSnapshotStore, MutualMatchStore, PoolFilter,
    ProfileStore, ProvisioningError, StoreError,
};
pub use router::matching_router;
pub use samples::{SampleConfig, SampleSupply};
pub use scoring::{Lenient, PolicyKind, ScoringConfig, ScoringPolicy, Strict};
pub use service::{FeedOrigin, MatchFeed, MatchingBackend, MatchmakingService};
