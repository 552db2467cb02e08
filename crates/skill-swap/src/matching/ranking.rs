use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{CandidateSource, MatchCandidate, Profile, UserId};
use super::reputation::honor_rating;
use super::repository::{MatchSnapshotStore, PoolFilter, ProfileStore, StoreError};
use super::scoring::{PolicyKind, PoolStrategy, ScoringConfig, ScoringPolicy};

/// Scores the candidate pool for a requester and keeps the ranked snapshot current.
pub struct MatchRankingEngine<P, S> {
    profiles: Arc<P>,
    snapshots: Arc<S>,
    config: ScoringConfig,
}

impl<P, S> MatchRankingEngine<P, S>
where
    P: ProfileStore + 'static,
    S: MatchSnapshotStore + 'static,
{
    pub fn new(profiles: Arc<P>, snapshots: Arc<S>, config: ScoringConfig) -> Self {
        Self {
            profiles,
            snapshots,
            config,
        }
    }

    pub fn requester(&self, user_id: &UserId) -> Result<Profile, MatchingError> {
        self.profiles
            .profile(user_id)?
            .ok_or_else(|| MatchingError::ProfileNotFound(user_id.clone()))
    }

    /// Rank candidates for `user_id` and replace the stored snapshot with the result.
    ///
    /// An empty pool yields an empty list; substituting samples is up to the caller.
    pub fn find_matches(
        &self,
        user_id: &UserId,
        kind: PolicyKind,
    ) -> Result<Vec<MatchCandidate>, MatchingError> {
        let requester = self.requester(user_id)?;
        self.find_matches_for(&requester, kind)
    }

    /// [`Self::find_matches`] for a requester profile the caller already loaded.
    pub fn find_matches_for(
        &self,
        requester: &Profile,
        kind: PolicyKind,
    ) -> Result<Vec<MatchCandidate>, MatchingError> {
        let user_id = &requester.user_id;
        let policy = kind.build(&self.config);
        let pool = self.candidate_pool(requester, policy.pool_strategy())?;
        debug!(user = %user_id, policy = kind.label(), pool = pool.len(), "scoring candidate pool");

        let ranked = rank(requester, pool, policy.as_ref());
        self.snapshots.replace_snapshot(user_id, ranked.clone())?;

        info!(user = %user_id, policy = kind.label(), matches = ranked.len(), "match snapshot replaced");
        Ok(ranked)
    }

    pub fn stored_matches(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, MatchingError> {
        Ok(self.snapshots.snapshot(user_id)?)
    }

    fn candidate_pool(
        &self,
        requester: &Profile,
        strategy: PoolStrategy,
    ) -> Result<Vec<Profile>, StoreError> {
        match strategy {
            PoolStrategy::AllPublic => self.profiles.query_public(&PoolFilter::Everyone),
            PoolStrategy::TeachersOfWantedSkills => {
                let mut pool = Vec::new();
                for skill in &requester.skills_learn {
                    let filter = PoolFilter::TeachesAnyOf(vec![skill.clone()]);
                    pool.extend(self.profiles.query_public(&filter)?);
                }
                Ok(pool)
            }
        }
    }
}

/// Score, filter, dedupe, and stably sort `pool` against `requester`.
pub fn rank(
    requester: &Profile,
    pool: Vec<Profile>,
    policy: &dyn ScoringPolicy,
) -> Vec<MatchCandidate> {
    let now = Utc::now();
    let mut ranked: Vec<MatchCandidate> = Vec::new();
    let mut positions: HashMap<UserId, usize> = HashMap::new();

    for candidate in pool {
        // Sample ids are reserved; a stored profile under one is never a real candidate.
        if candidate.user_id == requester.user_id
            || candidate.user_id.has_sample_prefix()
            || !candidate.is_matchable()
        {
            continue;
        }

        let score = policy.score(requester, &candidate);
        if !policy.admits(score) {
            continue;
        }

        if let Some(&position) = positions.get(&candidate.user_id) {
            if let Some(existing) = ranked.get_mut(position) {
                if score > existing.score {
                    existing.display_name = candidate.label().to_string();
                    existing.score = score;
                    existing.reason = policy.reason(requester, &candidate);
                    existing.honor_rating = honor_rating(candidate.honor_score);
                }
            }
            continue;
        }

        positions.insert(candidate.user_id.clone(), ranked.len());
        ranked.push(MatchCandidate {
            candidate_id: candidate.user_id.clone(),
            display_name: candidate.label().to_string(),
            score,
            reason: policy.reason(requester, &candidate),
            honor_rating: honor_rating(candidate.honor_score),
            source: CandidateSource::Real,
            timestamp: now,
        });
    }

    // `sort_by` is stable, so equal scores keep discovery order.
    ranked.sort_by(|left, right| right.score.cmp(&left.score));
    ranked
}

/// Error raised while ranking matches.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("profile not found for user {0}")]
    ProfileNotFound(UserId),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
