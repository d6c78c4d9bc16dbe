//! Review recording and the rest of an item's write path.

use super::{Scheduler, require_owner};
use crate::database::ItemStore;
use crate::error::{Result, SrsError, require_id};
use crate::models::{ItemStatus, Quality, ReviewEvent, SchedulableItem, sm2, status};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// One learner's answer to one item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub item_id: String,
    pub owner_id: String,
    /// Raw grade; validated against `0..=5` before anything is read.
    pub quality: i64,
    /// Defaults to the time the review is recorded.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

impl ReviewRequest {
    pub fn new(item_id: impl Into<String>, owner_id: impl Into<String>, quality: i64) -> Self {
        Self {
            item_id: item_id.into(),
            owner_id: owner_id.into(),
            quality,
            occurred_at: None,
            response_time_ms: None,
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn response_time_ms(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// What happens to review events when their item is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Keep events for historical statistics.
    #[default]
    Retain,
    Purge,
}

impl HistoryPolicy {
    fn purges(self) -> bool {
        self == HistoryPolicy::Purge
    }
}

/// Result a given grade would produce, without recording anything.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPreview {
    pub quality: Quality,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub status: ItemStatus,
    pub next_review_at: DateTime<Utc>,
}

enum Step<T> {
    Commit {
        item: SchedulableItem,
        event: Option<ReviewEvent>,
        output: T,
    },
    Unchanged(T),
}

impl<S: ItemStore> Scheduler<S> {
    /// Starts tracking `content_ref` for `owner_id`. The item is due at once.
    pub fn create_item(&self, owner_id: &str, content_ref: &str, scope: Option<&str>) -> Result<SchedulableItem> {
        require_owner(owner_id)?;
        require_id(content_ref, "content_ref")?;

        let item = SchedulableItem::new(
            owner_id,
            content_ref,
            scope,
            self.config.scheduling.initial_ease_factor,
            Utc::now(),
        );
        self.store.insert_item(&item)?;
        info!("Created item {} for owner {} (content {})", item.id, owner_id, content_ref);
        Ok(item)
    }

    /// Applies one review: SM-2 step, status transition, and the review
    /// event, committed together or not at all.
    pub fn record_review(&self, request: &ReviewRequest) -> Result<(SchedulableItem, ReviewEvent)> {
        let quality = Quality::new(request.quality)?;
        require_id(&request.item_id, "item_id")?;
        require_owner(&request.owner_id)?;

        let occurred_at = request.occurred_at.unwrap_or_else(Utc::now);
        let policy = &self.config.scheduling;

        self.update_with_retry(&request.item_id, &request.owner_id, |current| {
            if current.status == ItemStatus::Suspended {
                return Err(SrsError::Conflict(format!(
                    "item {} is suspended; unsuspend it before reviewing",
                    current.id
                )));
            }

            let outcome = sm2::compute_next_state(&current.srs_state(), quality, policy);
            let next = status::next_status(current.status, &outcome, policy.mastery_threshold);
            let updated = current.with_review(&outcome, next, occurred_at)?;
            let event = ReviewEvent::new(
                &current.id,
                &current.owner_id,
                quality,
                occurred_at,
                outcome.interval_days,
                outcome.ease_factor,
                request.response_time_ms,
            );

            debug!(
                "Item {}: q={} {} -> {}, interval {}d, EF {:.2}, reps {}",
                current.id, quality, current.status, next, outcome.interval_days, outcome.ease_factor,
                outcome.repetitions
            );

            Ok(Step::Commit {
                item: updated.clone(),
                event: Some(event.clone()),
                output: (updated, event),
            })
        })
    }

    /// Suspends or restores an item. Toggling to the current state is a no-op.
    pub fn set_suspended(&self, item_id: &str, owner_id: &str, suspended: bool) -> Result<SchedulableItem> {
        require_id(item_id, "item_id")?;
        require_owner(owner_id)?;

        self.update_with_retry(item_id, owner_id, |current| {
            let is_suspended = current.status == ItemStatus::Suspended;
            if is_suspended == suspended {
                return Ok(Step::Unchanged(current));
            }

            let now = Utc::now();
            let updated = if suspended {
                current.suspended(now)
            } else {
                current.resumed(now)
            };
            info!("Item {}: {} -> {}", current.id, current.status, updated.status);
            Ok(Step::Commit {
                item: updated.clone(),
                event: None,
                output: updated,
            })
        })
    }

    pub fn delete_item(&self, item_id: &str, policy: HistoryPolicy) -> Result<()> {
        require_id(item_id, "item_id")?;
        if !self.store.delete_item(item_id, policy.purges())? {
            return Err(SrsError::NotFound(format!("item {item_id}")));
        }
        info!("Deleted item {item_id} ({policy:?} history)");
        Ok(())
    }

    /// Deletes every item tracking `content_ref`. Returns how many went.
    pub fn delete_items_for_content(&self, content_ref: &str, policy: HistoryPolicy) -> Result<usize> {
        require_id(content_ref, "content_ref")?;
        let removed = self.store.delete_items_for_content(content_ref, policy.purges())?;
        info!("Deleted {removed} item(s) for content {content_ref} ({policy:?} history)");
        Ok(removed)
    }

    /// Most recent reviews of an item, newest first.
    pub fn review_history(&self, item_id: &str, owner_id: &str, limit: usize) -> Result<Vec<ReviewEvent>> {
        require_id(item_id, "item_id")?;
        require_owner(owner_id)?;
        self.load_owned(item_id, owner_id)?;
        self.store.events_for_item(item_id, limit)
    }

    /// Outcome of every grade for the item as it stands now.
    pub fn preview_review(&self, item_id: &str, owner_id: &str) -> Result<Vec<ReviewPreview>> {
        require_id(item_id, "item_id")?;
        require_owner(owner_id)?;
        let item = self.load_owned(item_id, owner_id)?;
        if item.status == ItemStatus::Suspended {
            return Err(SrsError::Conflict(format!("item {item_id} is suspended")));
        }

        let policy = &self.config.scheduling;
        let now = Utc::now();
        sm2::preview_outcomes(&item.srs_state(), policy)
            .into_iter()
            .map(|(quality, outcome)| {
                Ok(ReviewPreview {
                    quality,
                    interval_days: outcome.interval_days,
                    ease_factor: outcome.ease_factor,
                    status: status::next_status(item.status, &outcome, policy.mastery_threshold),
                    next_review_at: sm2::next_review_at(now, outcome.interval_days)?,
                })
            })
            .collect()
    }

    /// Optimistic read-modify-write of one item.
    ///
    /// `step` sees the freshly loaded item on every attempt. A lost race is
    /// retried up to `max_commit_attempts` times, then reported as a conflict.
    fn update_with_retry<T, F>(&self, item_id: &str, owner_id: &str, mut step: F) -> Result<T>
    where
        F: FnMut(SchedulableItem) -> Result<Step<T>>,
    {
        let attempts = self.config.max_commit_attempts;
        for attempt in 1..=attempts {
            let current = self.load_owned(item_id, owner_id)?;
            let expected_version = current.version;

            match step(current)? {
                Step::Unchanged(output) => return Ok(output),
                Step::Commit { item, event, output } => {
                    if self.store.commit_item(&item, expected_version, event.as_ref())? {
                        return Ok(output);
                    }
                    warn!("Item {item_id}: concurrent write detected (attempt {attempt}/{attempts})");
                }
            }
        }

        Err(SrsError::Conflict(format!(
            "item {item_id} kept changing; gave up after {attempts} attempts"
        )))
    }
}
