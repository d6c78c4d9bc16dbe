//! Keyset pagination for due-item listings.
use super::SchedulableItem;
use super::timestamp::{join_timestamp, split_timestamp};
use crate::error::SrsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position after the last item of a page, ordered by `(nextReviewAt, id)`.
///
/// Rendered as an opaque `"<secs>.<nanos>:<id>"` token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueCursor {
    pub next_review_at: DateTime<Utc>,
    pub item_id: String,
}

impl DueCursor {
    pub fn after(item: &SchedulableItem) -> Option<Self> {
        item.next_review_at.map(|at| Self {
            next_review_at: at,
            item_id: item.id.clone(),
        })
    }
}

impl fmt::Display for DueCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (secs, nanos) = split_timestamp(self.next_review_at);
        write!(f, "{secs}.{nanos:09}:{}", self.item_id)
    }
}

impl FromStr for DueCursor {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SrsError::Validation(format!("malformed cursor '{s}'"));
        let (at, item_id) = s.split_once(':').ok_or_else(invalid)?;
        let (secs, nanos) = at.split_once('.').ok_or_else(invalid)?;
        if item_id.is_empty() || nanos.len() != 9 {
            return Err(invalid());
        }
        let secs: i64 = secs.parse().map_err(|_| invalid())?;
        let nanos: u32 = nanos.parse().map_err(|_| invalid())?;
        Ok(Self {
            next_review_at: join_timestamp(secs, nanos).map_err(|_| invalid())?,
            item_id: item_id.to_string(),
        })
    }
}

impl Serialize for DueCursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueCursor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuePage {
    pub items: Vec<SchedulableItem>,
    /// Set when more due items may follow.
    pub next_cursor: Option<DueCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_token_round_trip() {
        let cursor = DueCursor {
            next_review_at: DateTime::from_timestamp_nanos(1_700_000_000_123_456_789),
            item_id: "3f1c:weird".to_string(),
        };
        let token = cursor.to_string();
        assert_eq!(token, "1700000000.123456789:3f1c:weird");
        assert_eq!(token.parse::<DueCursor>().unwrap(), cursor);
    }

    #[test]
    fn test_cursor_outside_nanosecond_range() {
        // later than anything an i64 of nanoseconds can hold
        let far = DateTime::from_timestamp(400 * 365 * 86_400, 5).unwrap();
        for at in [far, DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC] {
            let cursor = DueCursor {
                next_review_at: at,
                item_id: "item".to_string(),
            };
            assert_eq!(cursor.to_string().parse::<DueCursor>().unwrap(), cursor);
        }
        assert!(far.timestamp_nanos_opt().is_none());
    }

    #[test]
    fn test_malformed_cursor() {
        for bad in [
            "",
            "abc",
            "12:",
            "x:item",
            "12:item",
            "12.5:item",
            "1.x00000000:item",
            "99999999999999999.000000000:item",
        ] {
            assert!(matches!(bad.parse::<DueCursor>(), Err(SrsError::Validation(_))));
        }
    }
}
