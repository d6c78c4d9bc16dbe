//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates optimal review intervals based on recall quality:
//! - Each item has an easiness factor (EF) that adjusts based on performance
//! - Quality grades 0-2: Reset interval and repetitions (item needs relearning)
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF is adjusted after every review, lapses included, and never falls below 1.3
//! - Higher quality responses lead to longer intervals between reviews

use super::Quality;
use crate::config::SchedulingPolicy;
use crate::error::{Result, SrsError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// E-Factor floor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// E-Factor of a freshly created item.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// The numeric part of an item's scheduling state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SrsState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
}

impl Default for SrsState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
        }
    }
}

/// Result of one review.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsOutcome {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub is_lapse: bool,
}

/// Calculates the next scheduling state according to the SM-2 algorithm.
///
/// Deterministic and side-effect free; the caller derives `nextReviewAt`
/// with [`next_review_at`].
pub fn compute_next_state(
    current: &SrsState,
    quality: Quality,
    policy: &SchedulingPolicy,
) -> SrsOutcome {
    // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
    let distance = 5.0 - f64::from(quality.value());
    let ease_factor =
        (current.ease_factor + (0.1 - distance * (0.08 + distance * 0.02))).max(MIN_EASE_FACTOR);

    if quality.is_lapse() {
        return SrsOutcome {
            ease_factor,
            interval_days: policy.lapse_interval_days.min(policy.max_interval_days),
            repetitions: 0,
            is_lapse: true,
        };
    }

    let repetitions = current.repetitions.saturating_add(1);
    let interval_days = match repetitions {
        1 => 1,
        2 => 6,
        // float-to-int `as` saturates, so a corrupt huge interval cannot wrap
        _ => (f64::from(current.interval_days) * ease_factor).round() as u32,
    };
    // a success always moves the item forward, and never past the cap
    let interval_days = interval_days.clamp(1, policy.max_interval_days.max(1));

    SrsOutcome {
        ease_factor,
        interval_days,
        repetitions,
        is_lapse: false,
    }
}

/// `occurred_at + interval_days`; an interval of 0 means due at `occurred_at`.
///
/// Fails with `Validation` when the result falls outside the representable range.
pub fn next_review_at(occurred_at: DateTime<Utc>, interval_days: u32) -> Result<DateTime<Utc>> {
    occurred_at
        .checked_add_signed(Duration::days(i64::from(interval_days)))
        .ok_or_else(|| {
            SrsError::Validation(format!(
                "review at {occurred_at} plus {interval_days} day(s) is out of range"
            ))
        })
}

/// Outcome of every possible grade for `current`, lowest grade first.
pub fn preview_outcomes(current: &SrsState, policy: &SchedulingPolicy) -> Vec<(Quality, SrsOutcome)> {
    Quality::ALL
        .iter()
        .map(|&q| (q, compute_next_state(current, q, policy)))
        .collect()
}

/// Formats an interval in days as a short human-readable string.
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{days}d"),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn state(ease_factor: f64, interval_days: u32, repetitions: u32) -> SrsState {
        SrsState {
            ease_factor,
            interval_days,
            repetitions,
        }
    }

    #[test]
    fn test_first_review() {
        let next = compute_next_state(&SrsState::default(), q(4), &SchedulingPolicy::default());
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 1);
        assert!(!next.is_lapse);
    }

    #[test]
    fn test_second_review() {
        let next = compute_next_state(&state(2.5, 1, 1), q(4), &SchedulingPolicy::default());
        assert_eq!(next.interval_days, 6);
        assert_eq!(next.repetitions, 2);
    }

    #[test]
    fn test_perfect_sequence() {
        let policy = SchedulingPolicy::default();
        let first = compute_next_state(&SrsState::default(), q(5), &policy);
        assert!((first.ease_factor - 2.6).abs() < 1e-9);
        assert_eq!(first.interval_days, 1);

        let second = compute_next_state(
            &state(first.ease_factor, first.interval_days, first.repetitions),
            q(5),
            &policy,
        );
        assert_eq!((second.repetitions, second.interval_days), (2, 6));

        let third = compute_next_state(
            &state(second.ease_factor, second.interval_days, second.repetitions),
            q(5),
            &policy,
        );
        assert_eq!(third.repetitions, 3);
        assert_eq!(third.interval_days, (6.0 * third.ease_factor).round() as u32);
        assert_eq!(third.interval_days, 17);
    }

    #[test]
    fn test_quality_below_3_resets() {
        let next = compute_next_state(&state(2.6, 6, 2), q(1), &SchedulingPolicy::default());
        assert_eq!(next.interval_days, 0);
        assert_eq!(next.repetitions, 0);
        assert!(next.is_lapse);
        // EF is still updated
        assert!(next.ease_factor < 2.6);
    }

    #[test]
    fn test_lapse_interval_follows_policy() {
        let policy = SchedulingPolicy {
            lapse_interval_days: 1,
            ..SchedulingPolicy::default()
        };
        let next = compute_next_state(&state(2.5, 20, 4), q(0), &policy);
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn test_ef_floor_over_domain() {
        let policy = SchedulingPolicy::default();
        for ef in [1.3, 1.35, 1.5, 2.0, 2.5, 3.2] {
            for interval in [0, 1, 6, 15, 200] {
                for reps in [0, 1, 2, 3, 10] {
                    for grade in Quality::ALL {
                        let next = compute_next_state(&state(ef, interval, reps), grade, &policy);
                        assert!(next.ease_factor >= MIN_EASE_FACTOR);
                        if grade.is_lapse() {
                            assert_eq!(next.repetitions, 0);
                            assert_eq!(next.interval_days, 0);
                        } else {
                            assert_eq!(next.repetitions, reps + 1);
                            assert!(next.interval_days >= 1);
                            assert!(next.interval_days <= policy.max_interval_days);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_quality_3_lowers_ease_without_lapse() {
        let next = compute_next_state(&state(2.5, 6, 2), q(3), &SchedulingPolicy::default());
        assert!(!next.is_lapse);
        assert!((next.ease_factor - 2.36).abs() < 1e-9);
        assert_eq!(next.interval_days, 14);
    }

    #[test]
    fn test_next_review_at() {
        let now = Utc::now();
        assert_eq!(next_review_at(now, 0).unwrap(), now);
        assert_eq!(next_review_at(now, 6).unwrap(), now + Duration::days(6));
    }

    #[test]
    fn test_next_review_at_overflow_is_an_error() {
        let result = next_review_at(DateTime::<Utc>::MAX_UTC, 1);
        assert!(matches!(result, Err(SrsError::Validation(_))));
    }

    #[test]
    fn test_zero_interval_success_still_advances() {
        // e.g. a lapse recorded under a non-zero lapse interval, then the policy changed
        let next = compute_next_state(&state(2.5, 0, 4), q(4), &SchedulingPolicy::default());
        assert_eq!(next.repetitions, 5);
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn test_interval_is_capped() {
        let policy = SchedulingPolicy::default();
        let next = compute_next_state(&state(2.8, 30_000, 9), q(5), &policy);
        assert_eq!(next.interval_days, policy.max_interval_days);

        let mut s = SrsState::default();
        for _ in 0..15 {
            let next = compute_next_state(&s, q(5), &policy);
            assert!(next.interval_days <= 36_500);
            s = state(next.ease_factor, next.interval_days, next.repetitions);
        }
        assert_eq!(s.interval_days, 36_500);
    }

    #[test]
    fn test_preview_covers_all_grades() {
        let preview = preview_outcomes(&state(2.5, 6, 2), &SchedulingPolicy::default());
        assert_eq!(preview.len(), 6);
        assert!(preview[..3].iter().all(|(_, o)| o.is_lapse));
        assert_eq!(preview[5].1.interval_days, 16);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
    }
}
