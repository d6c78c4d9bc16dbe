//! Item lifecycle: LEARNING → REVIEWING → MASTERED, with lapses falling back
//! to LEARNING and SUSPENDED entered and left only through an explicit toggle.

use super::SrsOutcome;
use crate::error::SrsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Learning,
    Reviewing,
    Mastered,
    Suspended,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Learning,
        ItemStatus::Reviewing,
        ItemStatus::Mastered,
        ItemStatus::Suspended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Learning => "LEARNING",
            ItemStatus::Reviewing => "REVIEWING",
            ItemStatus::Mastered => "MASTERED",
            ItemStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SrsError::Serialization(format!("unknown item status '{s}'")))
    }
}

/// Status after a review whose numeric outcome is `outcome`.
///
/// Moves at most one step forward per review. A suspended item is returned
/// unchanged; reviews of suspended items are rejected before this point.
pub fn next_status(prior: ItemStatus, outcome: &SrsOutcome, mastery_threshold: u32) -> ItemStatus {
    if prior == ItemStatus::Suspended {
        return prior;
    }
    if outcome.is_lapse {
        return ItemStatus::Learning;
    }
    match prior {
        ItemStatus::Learning if outcome.repetitions >= 1 => ItemStatus::Reviewing,
        ItemStatus::Reviewing if outcome.repetitions >= mastery_threshold => ItemStatus::Mastered,
        other => other,
    }
}
