use super::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one review, appended together with the item update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub id: String,
    pub item_id: String,
    pub owner_id: String,
    pub quality: Quality,
    pub occurred_at: DateTime<Utc>,
    pub resulting_interval_days: u32,
    pub resulting_ease_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ReviewEvent {
    pub fn new(
        item_id: &str,
        owner_id: &str,
        quality: Quality,
        occurred_at: DateTime<Utc>,
        resulting_interval_days: u32,
        resulting_ease_factor: f64,
        response_time_ms: Option<u64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            owner_id: owner_id.to_string(),
            quality,
            occurred_at,
            resulting_interval_days,
            resulting_ease_factor,
            response_time_ms,
        }
    }
}
