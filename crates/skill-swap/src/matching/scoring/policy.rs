use super::super::domain::Profile;
use super::config::ScoringConfig;
use super::skills::{common_languages, complementary_pairs, matched_teach_skills};
use super::{PolicyKind, PoolStrategy, ScoringPolicy};

fn skill_match_count(a: &Profile, b: &Profile) -> (usize, usize) {
    let a_to_b = complementary_pairs(&a.skills_teach, &b.skills_learn).count();
    let b_to_a = complementary_pairs(&b.skills_teach, &a.skills_learn).count();
    (a_to_b, b_to_a)
}

fn points(count: usize, each: i64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX).saturating_mul(each)
}

/// Full-profile policy: skills, languages, nationality, experience, and reputation,
/// with a positive-score floor.
#[derive(Debug, Clone)]
pub struct Strict {
    config: ScoringConfig,
}

impl Strict {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoringPolicy for Strict {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Strict
    }

    fn pool_strategy(&self) -> PoolStrategy {
        PoolStrategy::AllPublic
    }

    fn enforces_floor(&self) -> bool {
        true
    }

    fn compatibility(&self, a: &Profile, b: &Profile) -> i64 {
        let (a_to_b, b_to_a) = skill_match_count(a, b);
        let mut total = points(a_to_b + b_to_a, self.config.skill_match_points);

        let languages = common_languages(&a.languages, &b.languages).len();
        total += points(languages, self.config.shared_language_points);

        if let (Some(left), Some(right)) = (a.nationality(), b.nationality()) {
            if left == right {
                total += self.config.shared_nationality_points;
            }
        }

        if a.experience_level == b.experience_level {
            total += self.config.same_experience_points;
        }

        total
    }

    fn score(&self, requester: &Profile, candidate: &Profile) -> i64 {
        self.compatibility(requester, candidate)
            + self.config.reputation_bonus(candidate.honor_score)
    }

    fn reason(&self, requester: &Profile, candidate: &Profile) -> String {
        let mut parts = Vec::new();

        let you_teach = matched_teach_skills(&requester.skills_teach, &candidate.skills_learn);
        if !you_teach.is_empty() {
            parts.push(format!("You can teach {}.", you_teach.join(", ")));
        }

        let they_teach = matched_teach_skills(&candidate.skills_teach, &requester.skills_learn);
        if !they_teach.is_empty() {
            parts.push(format!(
                "{} can teach you {}.",
                candidate.label(),
                they_teach.join(", ")
            ));
        }

        let languages = common_languages(&requester.languages, &candidate.languages);
        if !languages.is_empty() {
            parts.push(format!("You both speak {}.", languages.join(", ")));
        }

        if let (Some(left), Some(right)) = (requester.nationality(), candidate.nationality()) {
            if left == right {
                parts.push(format!("You're both from {left}."));
            }
        }

        parts.join(" ")
    }
}

/// Skill-only policy with a bonus for two-way exchanges and overlapping availability.
/// No floor is applied.
#[derive(Debug, Clone)]
pub struct Lenient {
    config: ScoringConfig,
}

impl Lenient {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoringPolicy for Lenient {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Lenient
    }

    fn pool_strategy(&self) -> PoolStrategy {
        PoolStrategy::TeachersOfWantedSkills
    }

    fn enforces_floor(&self) -> bool {
        false
    }

    fn compatibility(&self, a: &Profile, b: &Profile) -> i64 {
        let (a_to_b, b_to_a) = skill_match_count(a, b);
        let mut total = points(a_to_b + b_to_a, self.config.skill_match_points);

        if a_to_b > 0 && b_to_a > 0 {
            total += self.config.mutual_exchange_bonus;
        }

        if let (Some(left), Some(right)) = (&a.availability, &b.availability) {
            if left.overlaps(right) {
                total += self.config.availability_bonus;
            }
        }

        total
    }

    fn score(&self, requester: &Profile, candidate: &Profile) -> i64 {
        self.compatibility(requester, candidate)
    }

    fn reason(&self, requester: &Profile, candidate: &Profile) -> String {
        complementary_pairs(&candidate.skills_teach, &requester.skills_learn)
            .next()
            .map(|(_, wanted)| format!("{} can teach you {}", candidate.label(), wanted))
            .unwrap_or_default()
    }
}
