//! Star rating arithmetic shared by the catalog and page payloads.

use serde::{Deserialize, Serialize};

/// Scale used for app ratings.
pub const MAX_STARS: u32 = 5;

/// How many full, half and empty stars represent a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRating {
    pub full: u32,
    pub half: u32,
    pub empty: u32,
}

impl StarRating {
    /// Splits `rating` into stars out of `max_rating`.
    ///
    /// A fractional part of at least one half renders as a half star.
    /// Ratings outside `[0, max_rating]` are clamped; NaN counts as zero.
    #[must_use]
    pub fn new(rating: f64, max_rating: u32) -> Self {
        let max = f64::from(max_rating);
        let rating = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, max)
        };

        let full = rating.floor() as u32;
        let half = u32::from(rating - rating.floor() >= 0.5 && full < max_rating);
        let empty = max_rating - full - half;

        Self { full, half, empty }
    }
}

/// Arithmetic mean of the given ratings, `0.0` when there are none.
#[must_use]
pub fn average_rating(values: &[i16]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    sum as f64 / values.len() as f64
}
