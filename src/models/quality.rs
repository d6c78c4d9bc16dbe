//! Recall quality scale.
//!
//! The authoritative scale is SM-2's six grades:
//! - 0: Complete blackout
//! - 1: Incorrect, answer recognised once shown
//! - 2: Incorrect, answer seemed easy once shown
//! - 3: Correct with serious difficulty
//! - 4: Correct after hesitation
//! - 5: Perfect recall
//!
//! Grades below 3 are lapses.

use crate::error::{Result, SrsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest grade that counts as a successful review.
pub const SUCCESS_THRESHOLD: u8 = 3;

/// A validated recall grade in `0..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(5);

    /// Every grade in ascending order.
    pub const ALL: [Quality; 6] = [
        Quality(0),
        Quality(1),
        Quality(2),
        Quality(3),
        Quality(4),
        Quality(5),
    ];

    /// Out-of-range grades are rejected, never clamped.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=5).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(SrsError::Validation(format!(
                "quality must be between 0 and 5, got {value}"
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_lapse(self) -> bool {
        self.0 < SUCCESS_THRESHOLD
    }
}

impl TryFrom<i64> for Quality {
    type Error = SrsError;

    fn try_from(value: i64) -> Result<Self> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Four-button rating used by some flashcard front-ends
/// (`BAD=0, DIFFICULT=1, GOOD=2, EASY=3`).
///
/// The two scales are not numerically interchangeable; ratings are mapped
/// onto a subset of the six-grade scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewRating {
    Bad,
    Difficult,
    Good,
    Easy,
}

impl ReviewRating {
    /// Parses the legacy numeric encoding (0..=3).
    pub fn from_level(level: i64) -> Result<Self> {
        match level {
            0 => Ok(ReviewRating::Bad),
            1 => Ok(ReviewRating::Difficult),
            2 => Ok(ReviewRating::Good),
            3 => Ok(ReviewRating::Easy),
            other => Err(SrsError::Validation(format!(
                "rating level must be between 0 and 3, got {other}"
            ))),
        }
    }

    pub fn to_quality(self) -> Quality {
        match self {
            ReviewRating::Bad => Quality(1),
            ReviewRating::Difficult => Quality(3),
            ReviewRating::Good => Quality(4),
            ReviewRating::Easy => Quality(5),
        }
    }
}

impl From<ReviewRating> for Quality {
    fn from(rating: ReviewRating) -> Self {
        rating.to_quality()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        for v in 0..=5 {
            assert_eq!(Quality::new(v).unwrap().value(), v as u8);
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(matches!(Quality::new(6), Err(SrsError::Validation(_))));
        assert!(matches!(Quality::new(-1), Err(SrsError::Validation(_))));
    }

    #[test]
    fn test_lapse_boundary() {
        assert!(Quality::new(2).unwrap().is_lapse());
        assert!(!Quality::new(3).unwrap().is_lapse());
    }

    #[test]
    fn test_rating_mapping() {
        assert_eq!(ReviewRating::from_level(0).unwrap(), ReviewRating::Bad);
        assert!(ReviewRating::Bad.to_quality().is_lapse());
        assert!(!ReviewRating::Difficult.to_quality().is_lapse());
        assert_eq!(Quality::from(ReviewRating::Easy), Quality::MAX);
        assert!(ReviewRating::from_level(4).is_err());
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let q: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }
}
