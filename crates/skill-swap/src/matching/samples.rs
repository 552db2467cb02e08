//! Placeholder candidates shown when ranking produces nothing.
//!
//! Sample ids live under [`SAMPLE_ID_PREFIX`] and every candidate is tagged
//! [`CandidateSource::Sample`], so connection handling never writes them to a store.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::{
    Availability, CandidateSource, ExperienceLevel, MatchCandidate, Profile, UserId, Visibility,
    SAMPLE_ID_PREFIX,
};
use super::reputation::honor_rating;

/// Score band sample candidates are drawn from, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub score_min: u8,
    pub score_max: u8,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            score_min: 70,
            score_max: 99,
        }
    }
}

pub struct SampleSupply {
    config: SampleConfig,
    pool: Vec<Profile>,
}

impl SampleSupply {
    pub fn new(config: SampleConfig) -> Self {
        Self {
            config,
            pool: sample_profiles(),
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.pool
    }

    pub fn sample_matches(&self) -> Vec<MatchCandidate> {
        self.sample_matches_with(&mut rand::rng())
    }

    /// Same as [`Self::sample_matches`] with a caller-supplied RNG.
    pub fn sample_matches_with<R: Rng>(&self, rng: &mut R) -> Vec<MatchCandidate> {
        let now = Utc::now();
        let (low, high) = if self.config.score_min <= self.config.score_max {
            (self.config.score_min, self.config.score_max)
        } else {
            (self.config.score_max, self.config.score_min)
        };

        self.pool
            .iter()
            .map(|profile| {
                let score = i64::from(rng.random_range(low..=high));
                let reason = if profile.skills_teach.is_empty() {
                    String::new()
                } else {
                    let index = rng.random_range(0..profile.skills_teach.len());
                    profile
                        .skills_teach
                        .get(index)
                        .map(|skill| format!("{} can teach you {}", profile.label(), skill))
                        .unwrap_or_default()
                };

                MatchCandidate {
                    candidate_id: profile.user_id.clone(),
                    display_name: profile.label().to_string(),
                    score,
                    reason,
                    honor_rating: honor_rating(profile.honor_score),
                    source: CandidateSource::Sample,
                    timestamp: now,
                }
            })
            .collect()
    }
}

fn sample_profile(
    index: u8,
    display_name: &str,
    locality: &str,
    teach: &[&str],
    learn: &[&str],
    availability: &str,
) -> Profile {
    Profile {
        user_id: UserId::new(format!("{SAMPLE_ID_PREFIX}{index}")),
        display_name: display_name.to_string(),
        skills_teach: teach.iter().map(|skill| skill.to_string()).collect(),
        skills_learn: learn.iter().map(|skill| skill.to_string()).collect(),
        experience_level: ExperienceLevel::Intermediate,
        languages: vec!["English".to_string()],
        nationality: None,
        locality: Some(locality.to_string()),
        availability: Some(Availability::FreeText(availability.to_string())),
        visibility: Visibility::Public,
        honor_score: 80,
        profile_created: true,
    }
}

fn sample_profiles() -> Vec<Profile> {
    vec![
        sample_profile(
            1,
            "Alex Johnson",
            "San Francisco, CA",
            &["JavaScript", "React", "Node.js"],
            &["UI/UX Design", "Graphic Design", "Public Speaking"],
            "Weekends, Evenings",
        ),
        sample_profile(
            2,
            "Maria Rodriguez",
            "New York, NY",
            &["UI/UX Design", "Figma", "Adobe XD"],
            &["JavaScript", "React", "Frontend Development"],
            "Weekdays, Mornings",
        ),
        sample_profile(
            3,
            "James Wilson",
            "Chicago, IL",
            &["Photography", "Photoshop", "Lightroom"],
            &["HTML", "CSS", "JavaScript"],
            "Weekends, Afternoons",
        ),
    ]
}
