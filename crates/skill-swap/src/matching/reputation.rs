//! Honor-score helpers. The score itself is owned by rating ingestion; the matching core
//! only reads it, labels it, and (for ingestion adapters) knows how it is derived.

use super::domain::HonorRating;

/// Average assumed when a user has not been rated yet.
pub const NEUTRAL_RATING: f64 = 2.5;

pub fn honor_rating(honor_score: u8) -> HonorRating {
    match honor_score {
        80..=u8::MAX => HonorRating::Excellent,
        60..=79 => HonorRating::High,
        40..=59 => HonorRating::Moderate,
        _ => HonorRating::Poor,
    }
}

/// Honor score from 1-5 star ratings: `round(average * multiplier)`, capped at 100.
pub fn honor_score_from_ratings(ratings: &[u8], multiplier: u8) -> u8 {
    let average = if ratings.is_empty() {
        NEUTRAL_RATING
    } else {
        let sum: u32 = ratings.iter().map(|rating| u32::from(*rating)).sum();
        f64::from(sum) / ratings.len() as f64
    };

    let scaled = (average * f64::from(multiplier)).round();
    scaled.clamp(0.0, 100.0) as u8
}
