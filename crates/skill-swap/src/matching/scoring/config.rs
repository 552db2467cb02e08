use serde::{Deserialize, Serialize};

/// Minimum honor score and the bonus it earns. Tiers are checked in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationTier {
    pub threshold: u8,
    pub bonus: i64,
}

/// Weights applied by the scoring policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skill_match_points: i64,
    pub shared_language_points: i64,
    pub shared_nationality_points: i64,
    pub same_experience_points: i64,
    pub reputation_tiers: Vec<ReputationTier>,
    pub mutual_exchange_bonus: i64,
    pub availability_bonus: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skill_match_points: 10,
            shared_language_points: 2,
            shared_nationality_points: 5,
            same_experience_points: 3,
            reputation_tiers: vec![
                ReputationTier {
                    threshold: 80,
                    bonus: 5,
                },
                ReputationTier {
                    threshold: 60,
                    bonus: 3,
                },
                ReputationTier {
                    threshold: 40,
                    bonus: 1,
                },
            ],
            mutual_exchange_bonus: 20,
            availability_bonus: 15,
        }
    }
}

impl ScoringConfig {
    pub fn reputation_bonus(&self, honor_score: u8) -> i64 {
        self.reputation_tiers
            .iter()
            .find(|tier| honor_score >= tier.threshold)
            .map(|tier| tier.bonus)
            .unwrap_or(0)
    }
}
