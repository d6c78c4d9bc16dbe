//! Per-learner scheduling record for one piece of content.
use super::sm2;
use super::{ItemStatus, SrsOutcome, SrsState};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulableItem {
    pub id: String,
    pub owner_id: String,
    /// Flashcard, question or notebook entry id. Opaque here.
    pub content_ref: String,
    /// Content collection (deck, notebook) used to narrow queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub status: ItemStatus,
    /// Status to restore on unsuspend. Only set while suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_status: Option<ItemStatus>,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub lapses: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Unset while suspended.
    pub next_review_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write; drives optimistic concurrency.
    pub version: u64,
}

impl SchedulableItem {
    /// A never-reviewed item, due immediately.
    pub fn new(owner_id: &str, content_ref: &str, scope: Option<&str>, ease_factor: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            content_ref: content_ref.to_string(),
            scope: scope.map(str::to_string),
            status: ItemStatus::Learning,
            resume_status: None,
            ease_factor,
            interval_days: 0,
            repetitions: 0,
            lapses: 0,
            last_reviewed_at: None,
            next_review_at: Some(now),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn srs_state(&self) -> SrsState {
        SrsState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }

    /// Suspended items are never due.
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.status != ItemStatus::Suspended && self.next_review_at.is_some_and(|at| at <= as_of)
    }

    /// Copy of `self` with a review applied; the version is bumped.
    ///
    /// Fails when the next review date would be out of range.
    pub fn with_review(
        &self,
        outcome: &SrsOutcome,
        status: ItemStatus,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            status,
            ease_factor: outcome.ease_factor,
            interval_days: outcome.interval_days,
            repetitions: outcome.repetitions,
            lapses: self.lapses + u32::from(outcome.is_lapse),
            last_reviewed_at: Some(occurred_at),
            next_review_at: Some(sm2::next_review_at(occurred_at, outcome.interval_days)?),
            updated_at: Utc::now(),
            version: self.version + 1,
            ..self.clone()
        })
    }

    /// Copy of `self` moved into SUSPENDED, remembering the current status.
    pub fn suspended(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: ItemStatus::Suspended,
            resume_status: Some(self.status),
            next_review_at: None,
            updated_at: now,
            version: self.version + 1,
            ..self.clone()
        }
    }

    /// Copy of `self` restored from SUSPENDED and due at `now`.
    pub fn resumed(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: self.resume_status.unwrap_or(ItemStatus::Learning),
            resume_status: None,
            next_review_at: Some(now),
            updated_at: now,
            version: self.version + 1,
            ..self.clone()
        }
    }
}
