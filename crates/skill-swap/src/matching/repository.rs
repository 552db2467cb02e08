use super::domain::{
    ChannelId, ConnectionDecision, MatchCandidate, MutualMatch, PairKey, Profile, UserId,
};
use super::scoring::teaches_any;

/// Optional restriction applied when querying public profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolFilter {
    Everyone,
    /// Profiles whose teachable skills fuzzy-intersect the given set.
    TeachesAnyOf(Vec<String>),
}

impl PoolFilter {
    pub fn admits(&self, profile: &Profile) -> bool {
        match self {
            PoolFilter::Everyone => true,
            PoolFilter::TeachesAnyOf(skills) => teaches_any(&profile.skills_teach, skills),
        }
    }
}

/// Read access to user profiles.
pub trait ProfileStore: Send + Sync {
    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError>;
    /// Public profiles admitted by `filter`, in the store's natural order.
    fn query_public(&self, filter: &PoolFilter) -> Result<Vec<Profile>, StoreError>;
}

/// Per-user ranked match snapshot, replaced wholesale on every ranking run.
pub trait MatchSnapshotStore: Send + Sync {
    fn replace_snapshot(
        &self,
        user_id: &UserId,
        candidates: Vec<MatchCandidate>,
    ) -> Result<(), StoreError>;
    fn snapshot(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, StoreError>;
}

pub trait DecisionStore: Send + Sync {
    /// Missing records are reported as `None`; callers treat that as "nothing decided".
    fn decision(&self, user_id: &UserId) -> Result<Option<ConnectionDecision>, StoreError>;
    fn put_decision(&self, decision: ConnectionDecision) -> Result<(), StoreError>;
}

pub trait MutualMatchStore: Send + Sync {
    fn mutual_match(&self, pair: &PairKey) -> Result<Option<MutualMatch>, StoreError>;
    /// Stores `record` only if its pair has none yet, as one atomic step.
    /// Returns the record already stored for the pair, or `None` when `record` was written.
    fn create_mutual_match(&self, record: MutualMatch) -> Result<Option<MutualMatch>, StoreError>;
    fn put_mutual_match(&self, record: MutualMatch) -> Result<(), StoreError>;
}

/// Outbound hook that makes sure a chat channel exists for a pair.
pub trait ChatProvisioner: Send + Sync {
    /// Must be idempotent: an existing channel for the pair is returned unchanged.
    fn ensure_channel(&self, pair: &PairKey) -> Result<ChannelId, ProvisioningError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("chat provisioning unavailable: {0}")]
    Unavailable(String),
}
