use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id prefix reserved for placeholder candidates served by the sample supply.
pub const SAMPLE_ID_PREFIX: &str = "sample-user-";

/// Honor score assigned to freshly registered profiles.
pub const DEFAULT_HONOR_SCORE: u8 = 50;

pub const MAX_HONOR_SCORE: u8 = 100;

/// Stable identifier of a platform user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether the id falls inside the namespace reserved for sample candidates.
    pub fn has_sample_prefix(&self) -> bool {
        self.0.starts_with(SAMPLE_ID_PREFIX)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Coarse part of the day a user is available in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// When a user can meet, either as a note or a per-day schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Availability {
    FreeText(String),
    Schedule(BTreeMap<Day, BTreeSet<TimeSlot>>),
}

impl Availability {
    /// Free text overlaps when the notes share a comma-separated entry (case-insensitive);
    /// schedules overlap when any day has a slot in common. Mixed variants never overlap.
    pub fn overlaps(&self, other: &Availability) -> bool {
        match (self, other) {
            (Availability::FreeText(left), Availability::FreeText(right)) => {
                let right_entries: BTreeSet<String> = free_text_entries(right).collect();
                free_text_entries(left).any(|entry| right_entries.contains(&entry))
            }
            (Availability::Schedule(left), Availability::Schedule(right)) => {
                left.iter().any(|(day, slots)| {
                    right
                        .get(day)
                        .map(|other_slots| !slots.is_disjoint(other_slots))
                        .unwrap_or(false)
                })
            }
            _ => false,
        }
    }
}

fn free_text_entries(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
}

/// A user's skill-exchange identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub skills_teach: Vec<String>,
    #[serde(default)]
    pub skills_learn: Vec<String>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_honor_score")]
    pub honor_score: u8,
    #[serde(default)]
    pub profile_created: bool,
}

fn default_honor_score() -> u8 {
    DEFAULT_HONOR_SCORE
}

impl Profile {
    /// Profile as it exists right after registration, before setup is completed.
    pub fn registered(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            skills_teach: Vec::new(),
            skills_learn: Vec::new(),
            experience_level: ExperienceLevel::default(),
            languages: Vec::new(),
            nationality: None,
            locality: None,
            availability: None,
            visibility: Visibility::Public,
            honor_score: DEFAULT_HONOR_SCORE,
            profile_created: false,
        }
    }

    /// Marks profile setup as complete.
    pub fn finalize(mut self) -> Self {
        self.profile_created = true;
        self
    }

    pub fn is_matchable(&self) -> bool {
        self.visibility == Visibility::Public && self.profile_created
    }

    /// Checks a profile before it is written. Sample ids are reserved and honor scores
    /// are capped at [`MAX_HONOR_SCORE`].
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.user_id.is_blank() {
            return Err(ProfileError::MissingUserId);
        }
        if self.user_id.has_sample_prefix() {
            return Err(ProfileError::ReservedUserId(self.user_id.clone()));
        }
        if self.honor_score > MAX_HONOR_SCORE {
            return Err(ProfileError::HonorScoreOutOfRange(self.honor_score));
        }
        Ok(())
    }

    /// Nationality with blank values treated as absent.
    pub fn nationality(&self) -> Option<&str> {
        self.nationality
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            self.user_id.as_str()
        } else {
            &self.display_name
        }
    }
}

/// Reasons a profile is refused by [`Profile::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("user id is required")]
    MissingUserId,
    #[error("user id {0} is reserved for sample candidates")]
    ReservedUserId(UserId),
    #[error("honor score {0} is outside 0..=100")]
    HonorScoreOutOfRange(u8),
}

/// Reputation bucket shown next to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HonorRating {
    Poor,
    Moderate,
    High,
    Excellent,
}

/// Whether a candidate is a real user or a placeholder from the sample supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    #[default]
    Real,
    Sample,
}

impl CandidateSource {
    /// Classifies an id received at the API boundary.
    pub fn of(user_id: &UserId) -> Self {
        if user_id.has_sample_prefix() {
            Self::Sample
        } else {
            Self::Real
        }
    }
}

/// One ranked entry in a user's match snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub candidate_id: UserId,
    pub display_name: String,
    pub score: i64,
    pub reason: String,
    pub honor_rating: HonorRating,
    pub source: CandidateSource,
    pub timestamp: DateTime<Utc>,
}

/// Latest accept or reject state for one directed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Undecided,
    Accepted,
    Rejected,
}

/// Per-user accept and reject sets. A target is in at most one set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDecision {
    pub user_id: UserId,
    #[serde(default)]
    pub accepted_matches: BTreeSet<UserId>,
    #[serde(default)]
    pub rejected_matches: BTreeSet<UserId>,
}

impl ConnectionDecision {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            accepted_matches: BTreeSet::new(),
            rejected_matches: BTreeSet::new(),
        }
    }

    pub fn decision_for(&self, target: &UserId) -> Decision {
        if self.accepted_matches.contains(target) {
            Decision::Accepted
        } else if self.rejected_matches.contains(target) {
            Decision::Rejected
        } else {
            Decision::Undecided
        }
    }

    pub fn accept(&mut self, target: UserId) {
        self.rejected_matches.remove(&target);
        self.accepted_matches.insert(target);
    }

    pub fn reject(&mut self, target: UserId) {
        self.accepted_matches.remove(&target);
        self.rejected_matches.insert(target);
    }
}

/// Unordered user pair, canonicalized by sorting the ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    first: UserId,
    second: UserId,
}

impl PairKey {
    pub fn new(a: &UserId, b: &UserId) -> Self {
        if a <= b {
            Self {
                first: a.clone(),
                second: b.clone(),
            }
        } else {
            Self {
                first: b.clone(),
                second: a.clone(),
            }
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.first, self.second)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutualMatchStatus {
    Active,
    Inactive,
}

/// Confirmed two-way connection. Membership is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualMatch {
    pair: PairKey,
    pub status: MutualMatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MutualMatch {
    pub fn new(pair: PairKey, now: DateTime<Utc>) -> Self {
        Self {
            pair,
            status: MutualMatchStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.status = MutualMatchStatus::Inactive;
        self.updated_at = now;
    }
}

/// Identifier of a provisioned chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);
