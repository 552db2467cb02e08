use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::MatchingConfig;
use crate::matching::domain::{
    ChannelId, ConnectionDecision, ExperienceLevel, MatchCandidate, MutualMatch, PairKey,
    Profile, UserId,
};
use crate::matching::repository::{
    ChatProvisioner, DecisionStore, MatchSnapshotStore, MutualMatchStore, PoolFilter,
    ProfileStore, ProvisioningError, StoreError,
};
use crate::matching::{matching_router, MatchmakingService};

pub(super) fn profile(id: &str, teach: &[&str], learn: &[&str]) -> Profile {
    let mut profile = Profile::registered(UserId::from(id), capitalize(id)).finalize();
    profile.skills_teach = teach.iter().map(|skill| skill.to_string()).collect();
    profile.skills_learn = learn.iter().map(|skill| skill.to_string()).collect();
    profile
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(super) fn with_languages(mut profile: Profile, languages: &[&str]) -> Profile {
    profile.languages = languages.iter().map(|lang| lang.to_string()).collect();
    profile
}

pub(super) fn with_nationality(mut profile: Profile, nationality: &str) -> Profile {
    profile.nationality = Some(nationality.to_string());
    profile
}

pub(super) fn with_experience(mut profile: Profile, level: ExperienceLevel) -> Profile {
    profile.experience_level = level;
    profile
}

pub(super) fn with_honor(mut profile: Profile, honor_score: u8) -> Profile {
    profile.honor_score = honor_score;
    profile
}

pub(super) fn uid(id: &str) -> UserId {
    UserId::from(id)
}

/// In-memory stand-in for the hosted document store. Profiles keep insertion order.
#[derive(Default, Clone)]
pub(super) struct MemoryBackend {
    profiles: Arc<Mutex<Vec<Profile>>>,
    snapshots: Arc<Mutex<HashMap<UserId, Vec<MatchCandidate>>>>,
    decisions: Arc<Mutex<HashMap<UserId, ConnectionDecision>>>,
    mutuals: Arc<Mutex<BTreeMap<PairKey, MutualMatch>>>,
    mutual_writes: Arc<Mutex<usize>>,
}

impl MemoryBackend {
    pub(super) fn with_profiles(profiles: Vec<Profile>) -> Self {
        let backend = Self::default();
        *backend.profiles.lock().expect("profile mutex poisoned") = profiles;
        backend
    }

    pub(super) fn mutual_records(&self) -> Vec<MutualMatch> {
        self.mutuals
            .lock()
            .expect("mutual mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn mutual_writes(&self) -> usize {
        *self.mutual_writes.lock().expect("counter mutex poisoned")
    }

    pub(super) fn stored_decision(&self, user: &UserId) -> Option<ConnectionDecision> {
        self.decisions
            .lock()
            .expect("decision mutex poisoned")
            .get(user)
            .cloned()
    }
}

impl ProfileStore for MemoryBackend {
    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.iter().find(|profile| &profile.user_id == user_id).cloned())
    }

    fn query_public(&self, filter: &PoolFilter) -> Result<Vec<Profile>, StoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard
            .iter()
            .filter(|profile| profile.visibility == crate::matching::Visibility::Public)
            .filter(|profile| filter.admits(profile))
            .cloned()
            .collect())
    }
}

impl MatchSnapshotStore for MemoryBackend {
    fn replace_snapshot(
        &self,
        user_id: &UserId,
        candidates: Vec<MatchCandidate>,
    ) -> Result<(), StoreError> {
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .insert(user_id.clone(), candidates);
        Ok(())
    }

    fn snapshot(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, StoreError> {
        Ok(self
            .snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl DecisionStore for MemoryBackend {
    fn decision(&self, user_id: &UserId) -> Result<Option<ConnectionDecision>, StoreError> {
        Ok(self.stored_decision(user_id))
    }

    fn put_decision(&self, decision: ConnectionDecision) -> Result<(), StoreError> {
        self.decisions
            .lock()
            .expect("decision mutex poisoned")
            .insert(decision.user_id.clone(), decision);
        Ok(())
    }
}

impl MutualMatchStore for MemoryBackend {
    fn mutual_match(&self, pair: &PairKey) -> Result<Option<MutualMatch>, StoreError> {
        Ok(self
            .mutuals
            .lock()
            .expect("mutual mutex poisoned")
            .get(pair)
            .cloned())
    }

    fn create_mutual_match(&self, record: MutualMatch) -> Result<Option<MutualMatch>, StoreError> {
        let mut guard = self.mutuals.lock().expect("mutual mutex poisoned");
        if let Some(existing) = guard.get(record.pair()) {
            return Ok(Some(existing.clone()));
        }
        *self.mutual_writes.lock().expect("counter mutex poisoned") += 1;
        guard.insert(record.pair().clone(), record);
        Ok(None)
    }

    fn put_mutual_match(&self, record: MutualMatch) -> Result<(), StoreError> {
        *self.mutual_writes.lock().expect("counter mutex poisoned") += 1;
        self.mutuals
            .lock()
            .expect("mutual mutex poisoned")
            .insert(record.pair().clone(), record);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryChats {
    calls: Arc<Mutex<Vec<PairKey>>>,
}

impl MemoryChats {
    pub(super) fn calls(&self) -> Vec<PairKey> {
        self.calls.lock().expect("chat mutex poisoned").clone()
    }
}

impl ChatProvisioner for MemoryChats {
    fn ensure_channel(&self, pair: &PairKey) -> Result<ChannelId, ProvisioningError> {
        self.calls
            .lock()
            .expect("chat mutex poisoned")
            .push(pair.clone());
        Ok(ChannelId(pair.to_string()))
    }
}

pub(super) struct OfflineChats;

impl ChatProvisioner for OfflineChats {
    fn ensure_channel(&self, _pair: &PairKey) -> Result<ChannelId, ProvisioningError> {
        Err(ProvisioningError::Unavailable("chat backend offline".to_string()))
    }
}

pub(super) struct UnavailableBackend;

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

impl ProfileStore for UnavailableBackend {
    fn profile(&self, _user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        Err(offline())
    }

    fn query_public(&self, _filter: &PoolFilter) -> Result<Vec<Profile>, StoreError> {
        Err(offline())
    }
}

impl MatchSnapshotStore for UnavailableBackend {
    fn replace_snapshot(
        &self,
        _user_id: &UserId,
        _candidates: Vec<MatchCandidate>,
    ) -> Result<(), StoreError> {
        Err(offline())
    }

    fn snapshot(&self, _user_id: &UserId) -> Result<Vec<MatchCandidate>, StoreError> {
        Err(offline())
    }
}

impl DecisionStore for UnavailableBackend {
    fn decision(&self, _user_id: &UserId) -> Result<Option<ConnectionDecision>, StoreError> {
        Err(offline())
    }

    fn put_decision(&self, _decision: ConnectionDecision) -> Result<(), StoreError> {
        Err(offline())
    }
}

impl MutualMatchStore for UnavailableBackend {
    fn mutual_match(&self, _pair: &PairKey) -> Result<Option<MutualMatch>, StoreError> {
        Err(offline())
    }

    fn create_mutual_match(
        &self,
        _record: MutualMatch,
    ) -> Result<Option<MutualMatch>, StoreError> {
        Err(offline())
    }

    fn put_mutual_match(&self, _record: MutualMatch) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// Profile reads succeed but the pool query fails.
pub(super) struct PoolOfflineBackend {
    pub(super) inner: MemoryBackend,
}

impl ProfileStore for PoolOfflineBackend {
    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        self.inner.profile(user_id)
    }

    fn query_public(&self, _filter: &PoolFilter) -> Result<Vec<Profile>, StoreError> {
        Err(offline())
    }
}

impl MatchSnapshotStore for PoolOfflineBackend {
    fn replace_snapshot(
        &self,
        user_id: &UserId,
        candidates: Vec<MatchCandidate>,
    ) -> Result<(), StoreError> {
        self.inner.replace_snapshot(user_id, candidates)
    }

    fn snapshot(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, StoreError> {
        self.inner.snapshot(user_id)
    }
}

/// Mutual-match reads always miss, as when another request created the record after
/// this one checked. Writes go to `inner`.
pub(super) struct StaleMutualReads {
    pub(super) inner: MemoryBackend,
}

impl MutualMatchStore for StaleMutualReads {
    fn mutual_match(&self, _pair: &PairKey) -> Result<Option<MutualMatch>, StoreError> {
        Ok(None)
    }

    fn create_mutual_match(&self, record: MutualMatch) -> Result<Option<MutualMatch>, StoreError> {
        self.inner.create_mutual_match(record)
    }

    fn put_mutual_match(&self, record: MutualMatch) -> Result<(), StoreError> {
        self.inner.put_mutual_match(record)
    }
}

pub(super) fn build_service(
    profiles: Vec<Profile>,
) -> (
    MatchmakingService<MemoryBackend, MemoryChats>,
    MemoryBackend,
    MemoryChats,
) {
    let backend = MemoryBackend::with_profiles(profiles);
    let chats = MemoryChats::default();
    let service = MatchmakingService::new(
        Arc::new(backend.clone()),
        Arc::new(chats.clone()),
        MatchingConfig::default(),
    );
    (service, backend, chats)
}

pub(super) fn router_with_service(
    service: MatchmakingService<MemoryBackend, MemoryChats>,
) -> axum::Router {
    matching_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Learner and tutor pool used across ranking and routing tests.
pub(super) fn python_pool() -> Vec<Profile> {
    vec![
        profile("alice", &["Guitar"], &["Python"]),
        profile("bob", &["Python", "Python for Data Science"], &["Guitar"]),
        profile("carol", &["Python"], &["Chess"]),
        profile("dave", &["Pottery"], &["Knitting"]),
    ]
}
