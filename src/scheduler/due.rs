//! Due-item listing.

use super::{Scheduler, require_owner};
use crate::database::ItemStore;
use crate::error::{Result, SrsError};
use crate::models::{DueCursor, DuePage};
use chrono::{DateTime, Utc};
use log::debug;

/// Optional knobs of a due-item listing.
#[derive(Clone, Debug, Default)]
pub struct DueQuery {
    /// Narrow to one content collection.
    pub scope: Option<String>,
    /// Defaults to now.
    pub as_of: Option<DateTime<Utc>>,
    /// Defaults to `default_page_size`; capped at `max_page_size`.
    pub limit: Option<usize>,
    /// Continue after a previous page.
    pub cursor: Option<DueCursor>,
}

impl<S: ItemStore> Scheduler<S> {
    /// Non-suspended items with `next_review_at <= as_of`, oldest-due first,
    /// ties broken by id.
    pub fn list_due_items(&self, owner_id: &str, query: &DueQuery) -> Result<DuePage> {
        require_owner(owner_id)?;
        let limit = match query.limit {
            Some(0) => return Err(SrsError::Validation("limit must be at least 1".into())),
            Some(n) => n.min(self.config.max_page_size),
            None => self.config.default_page_size,
        };
        let as_of = query.as_of.unwrap_or_else(Utc::now);

        // one extra row tells whether another page exists
        let mut items = self.store.query_due(
            owner_id,
            query.scope.as_deref(),
            as_of,
            query.cursor.as_ref(),
            limit + 1,
        )?;
        let has_more = items.len() > limit;
        items.truncate(limit);

        let next_cursor = if has_more {
            items.last().and_then(DueCursor::after)
        } else {
            None
        };
        debug!("Owner {owner_id}: {} due item(s), more={has_more}", items.len());

        Ok(DuePage { items, next_cursor })
    }
}
