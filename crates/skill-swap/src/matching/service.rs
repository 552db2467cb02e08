use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::MatchingConfig;

use super::connections::{ConnectionError, ConnectionOutcome, ConnectionService, ConnectionTarget};
use super::domain::{MatchCandidate, UserId};
use super::ranking::{MatchRankingEngine, MatchingError};
use super::repository::{
    ChatProvisioner, DecisionStore, MatchSnapshotStore, MutualMatchStore, ProfileStore,
};
use super::samples::SampleSupply;
use super::scoring::PolicyKind;

/// Persistence the matchmaking facade needs, usually one database handle.
pub trait MatchingBackend:
    ProfileStore + MatchSnapshotStore + DecisionStore + MutualMatchStore
{
}

impl<T> MatchingBackend for T where
    T: ProfileStore + MatchSnapshotStore + DecisionStore + MutualMatchStore
{
}

/// Where a feed's candidates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrigin {
    Ranked,
    Sample,
}

/// Candidates returned to a user browsing for matches.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFeed {
    pub user_id: UserId,
    pub policy: PolicyKind,
    pub origin: FeedOrigin,
    pub candidates: Vec<MatchCandidate>,
}

/// Service composing ranking, connection handling, and the sample fallback.
pub struct MatchmakingService<B, C> {
    ranking: MatchRankingEngine<B, B>,
    connections: ConnectionService<B, B, C>,
    samples: SampleSupply,
}

impl<B, C> MatchmakingService<B, C>
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    pub fn new(backend: Arc<B>, chats: Arc<C>, config: MatchingConfig) -> Self {
        let MatchingConfig {
            scoring, samples, ..
        } = config;

        Self {
            ranking: MatchRankingEngine::new(backend.clone(), backend.clone(), scoring),
            connections: ConnectionService::new(backend.clone(), backend, chats),
            samples: SampleSupply::new(samples),
        }
    }

    pub fn ranking(&self) -> &MatchRankingEngine<B, B> {
        &self.ranking
    }

    pub fn connections(&self) -> &ConnectionService<B, B, C> {
        &self.connections
    }

    /// Ranked matches, or sample candidates when there is nothing real to show.
    ///
    /// Falls back for a missing requester profile, a lenient search with no wanted
    /// skills, and an empty ranking. Store failures are returned to the caller.
    pub fn discover(
        &self,
        user_id: &UserId,
        policy: PolicyKind,
    ) -> Result<MatchFeed, MatchingError> {
        let requester = match self.ranking.requester(user_id) {
            Ok(profile) => profile,
            Err(MatchingError::ProfileNotFound(_)) => {
                warn!(user = %user_id, "requester profile missing; serving sample matches");
                return Ok(self.sample_feed(user_id, policy));
            }
            Err(err) => return Err(err),
        };

        if policy == PolicyKind::Lenient && requester.skills_learn.is_empty() {
            info!(user = %user_id, "no wanted skills listed; serving sample matches");
            return Ok(self.sample_feed(user_id, policy));
        }

        let candidates = self.ranking.find_matches_for(&requester, policy)?;
        if candidates.is_empty() {
            info!(user = %user_id, policy = policy.label(), "ranking empty; serving sample matches");
            return Ok(self.sample_feed(user_id, policy));
        }

        Ok(MatchFeed {
            user_id: user_id.clone(),
            policy,
            origin: FeedOrigin::Ranked,
            candidates,
        })
    }

    pub fn stored_matches(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, MatchingError> {
        self.ranking.stored_matches(user_id)
    }

    pub fn accept(
        &self,
        actor: &UserId,
        target: UserId,
    ) -> Result<ConnectionOutcome, ConnectionError> {
        self.connections
            .accept(actor, &ConnectionTarget::classify(target))
    }

    pub fn reject(
        &self,
        actor: &UserId,
        target: UserId,
    ) -> Result<ConnectionOutcome, ConnectionError> {
        self.connections
            .reject(actor, &ConnectionTarget::classify(target))
    }

    pub fn is_mutual(&self, a: &UserId, b: &UserId) -> Result<bool, ConnectionError> {
        self.connections.is_mutual(a, b)
    }

    pub fn mutual_matches(&self, user_id: &UserId) -> Result<Vec<UserId>, ConnectionError> {
        self.connections.mutual_matches(user_id)
    }

    fn sample_feed(&self, user_id: &UserId, policy: PolicyKind) -> MatchFeed {
        MatchFeed {
            user_id: user_id.clone(),
            policy,
            origin: FeedOrigin::Sample,
            candidates: self.samples.sample_matches(),
        }
    }
}
