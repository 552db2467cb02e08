use metrics_exporter_prometheus::PrometheusHandle;
use skill_swap::matching::reputation::honor_score_from_ratings;
use skill_swap::matching::{
    Availability, ChannelId, ChatProvisioner, ConnectionDecision, Day, DecisionStore,
    ExperienceLevel, MatchCandidate, MatchSnapshotStore, MutualMatch, MutualMatchStore, PairKey,
    PolicyKind, PoolFilter, Profile, ProfileStore, ProvisioningError, StoreError, TimeSlot,
    UserId, Visibility,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Handle used by the profile upkeep routes.
#[derive(Clone)]
pub(crate) struct Community {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) honor_multiplier: u8,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// Process-local document store. Profiles keep registration order so rankings stay stable.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    profiles: Mutex<Vec<Profile>>,
    ratings: Mutex<HashMap<UserId, Vec<u8>>>,
    snapshots: Mutex<HashMap<UserId, Vec<MatchCandidate>>>,
    decisions: Mutex<HashMap<UserId, ConnectionDecision>>,
    mutuals: Mutex<BTreeMap<PairKey, MutualMatch>>,
}

impl InMemoryStore {
    pub(crate) fn seeded() -> Result<Self, StoreError> {
        let store = Self::default();
        for profile in seed_profiles() {
            store.upsert_profile(profile)?;
        }
        Ok(store)
    }

    /// Inserts or replaces the profile with the same user id, keeping its position.
    pub(crate) fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let mut guard = lock(&self.profiles)?;
        match guard
            .iter_mut()
            .find(|existing| existing.user_id == profile.user_id)
        {
            Some(existing) => *existing = profile,
            None => guard.push(profile),
        }
        Ok(())
    }

    /// Appends a rating and recomputes the honor score. Returns `None` for unknown users.
    pub(crate) fn record_rating(
        &self,
        user_id: &UserId,
        rating: u8,
        multiplier: u8,
    ) -> Result<Option<Profile>, StoreError> {
        let mut profiles = lock(&self.profiles)?;
        let Some(profile) = profiles
            .iter_mut()
            .find(|profile| &profile.user_id == user_id)
        else {
            return Ok(None);
        };

        let mut ratings = lock(&self.ratings)?;
        let history = ratings.entry(user_id.clone()).or_default();
        history.push(rating);
        profile.honor_score = honor_score_from_ratings(history.as_slice(), multiplier);
        Ok(Some(profile.clone()))
    }

    pub(crate) fn mutual_count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.mutuals)?.len())
    }
}

impl ProfileStore for InMemoryStore {
    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let guard = lock(&self.profiles)?;
        Ok(guard
            .iter()
            .find(|profile| &profile.user_id == user_id)
            .cloned())
    }

    fn query_public(&self, filter: &PoolFilter) -> Result<Vec<Profile>, StoreError> {
        let guard = lock(&self.profiles)?;
        Ok(guard
            .iter()
            .filter(|profile| profile.visibility == Visibility::Public)
            .filter(|profile| filter.admits(profile))
            .cloned()
            .collect())
    }
}

impl MatchSnapshotStore for InMemoryStore {
    fn replace_snapshot(
        &self,
        user_id: &UserId,
        candidates: Vec<MatchCandidate>,
    ) -> Result<(), StoreError> {
        lock(&self.snapshots)?.insert(user_id.clone(), candidates);
        Ok(())
    }

    fn snapshot(&self, user_id: &UserId) -> Result<Vec<MatchCandidate>, StoreError> {
        Ok(lock(&self.snapshots)?
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl DecisionStore for InMemoryStore {
    fn decision(&self, user_id: &UserId) -> Result<Option<ConnectionDecision>, StoreError> {
        Ok(lock(&self.decisions)?.get(user_id).cloned())
    }

    fn put_decision(&self, decision: ConnectionDecision) -> Result<(), StoreError> {
        lock(&self.decisions)?.insert(decision.user_id.clone(), decision);
        Ok(())
    }
}

impl MutualMatchStore for InMemoryStore {
    fn mutual_match(&self, pair: &PairKey) -> Result<Option<MutualMatch>, StoreError> {
        Ok(lock(&self.mutuals)?.get(pair).cloned())
    }

    fn create_mutual_match(&self, record: MutualMatch) -> Result<Option<MutualMatch>, StoreError> {
        let mut guard = lock(&self.mutuals)?;
        if let Some(existing) = guard.get(record.pair()) {
            return Ok(Some(existing.clone()));
        }
        guard.insert(record.pair().clone(), record);
        Ok(None)
    }

    fn put_mutual_match(&self, record: MutualMatch) -> Result<(), StoreError> {
        lock(&self.mutuals)?.insert(record.pair().clone(), record);
        Ok(())
    }
}

/// Chat backend stand-in: one channel per pair, named after the pair key.
#[derive(Default)]
pub(crate) struct InMemoryChatProvisioner {
    channels: Mutex<BTreeSet<PairKey>>,
}

impl InMemoryChatProvisioner {
    pub(crate) fn channels(&self) -> Vec<ChannelId> {
        match self.channels.lock() {
            Ok(guard) => guard.iter().map(|pair| ChannelId(pair.to_string())).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl ChatProvisioner for InMemoryChatProvisioner {
    fn ensure_channel(&self, pair: &PairKey) -> Result<ChannelId, ProvisioningError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|_| ProvisioningError::Unavailable("chat registry lock poisoned".to_string()))?;
        guard.insert(pair.clone());
        Ok(ChannelId(pair.to_string()))
    }
}

pub(crate) fn parse_policy(raw: &str) -> Result<PolicyKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(PolicyKind::Strict),
        "lenient" => Ok(PolicyKind::Lenient),
        other => Err(format!("unknown policy '{other}' (expected strict or lenient)")),
    }
}

fn schedule(entries: Vec<(Day, Vec<TimeSlot>)>) -> Availability {
    Availability::Schedule(
        entries
            .into_iter()
            .map(|(day, slots)| (day, slots.into_iter().collect()))
            .collect(),
    )
}

struct Seed {
    id: &'static str,
    name: &'static str,
    teach: &'static [&'static str],
    learn: &'static [&'static str],
    languages: &'static [&'static str],
    nationality: &'static str,
    level: ExperienceLevel,
    honor: u8,
}

/// Small community loaded at startup and by the CLI demo.
pub(crate) fn seed_profiles() -> Vec<Profile> {
    let seeds = [
        Seed {
            id: "maya",
            name: "Maya Chen",
            teach: &["Spanish", "Guitar"],
            learn: &["Python"],
            languages: &["English", "Spanish"],
            nationality: "Mexico",
            level: ExperienceLevel::Intermediate,
            honor: 72,
        },
        Seed {
            id: "leo",
            name: "Leo Martins",
            teach: &["Python", "Data Science"],
            learn: &["Spanish"],
            languages: &["English", "Portuguese"],
            nationality: "Brazil",
            level: ExperienceLevel::Intermediate,
            honor: 85,
        },
        Seed {
            id: "priya",
            name: "Priya Nair",
            teach: &["Python for Data Science", "Yoga"],
            learn: &["Guitar"],
            languages: &["English", "Hindi"],
            nationality: "India",
            level: ExperienceLevel::Expert,
            honor: 64,
        },
        Seed {
            id: "tom",
            name: "Tom Becker",
            teach: &["Cooking"],
            learn: &["Chess"],
            languages: &["German"],
            nationality: "Germany",
            level: ExperienceLevel::Beginner,
            honor: 45,
        },
    ];

    let availability = [
        schedule(vec![
            (Day::Monday, vec![TimeSlot::Evening]),
            (Day::Saturday, vec![TimeSlot::Morning]),
        ]),
        schedule(vec![(Day::Monday, vec![TimeSlot::Evening, TimeSlot::Night])]),
        schedule(vec![(Day::Sunday, vec![TimeSlot::Afternoon])]),
        Availability::FreeText("weekends".to_string()),
    ];

    seeds
        .into_iter()
        .zip(availability)
        .map(|(seed, availability)| {
            let mut profile = Profile::registered(UserId::from(seed.id), seed.name).finalize();
            profile.skills_teach = seed.teach.iter().map(|skill| skill.to_string()).collect();
            profile.skills_learn = seed.learn.iter().map(|skill| skill.to_string()).collect();
            profile.languages = seed.languages.iter().map(|lang| lang.to_string()).collect();
            profile.nationality = Some(seed.nationality.to_string());
            profile.experience_level = seed.level;
            profile.honor_score = seed.honor;
            profile.availability = Some(availability);
            profile
        })
        .collect()
}
