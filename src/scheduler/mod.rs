//! Scheduling service over an [`ItemStore`].
//!
//! - `recorder`: item lifecycle, review recording, suspension, history
//! - `due`: paginated due-item listing
//! - `stats`: per-owner aggregates
//!
//! Every write is a per-item optimistic read-modify-write; reviews of
//! different items never coordinate.

pub mod due;
pub mod recorder;
pub mod stats;

pub use due::DueQuery;
pub use recorder::{HistoryPolicy, ReviewPreview, ReviewRequest};

use crate::config::SchedulerConfig;
use crate::database::ItemStore;
use crate::error::{Result, SrsError, require_id};
use crate::models::SchedulableItem;

pub struct Scheduler<S> {
    store: S,
    config: SchedulerConfig,
}

impl<S: ItemStore> Scheduler<S> {
    pub fn new(store: S, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an item and checks that `owner_id` owns it.
    fn load_owned(&self, item_id: &str, owner_id: &str) -> Result<SchedulableItem> {
        let item = self
            .store
            .get_item(item_id)?
            .ok_or_else(|| SrsError::NotFound(format!("item {item_id}")))?;
        if item.owner_id != owner_id {
            return Err(SrsError::Authorization(format!(
                "item {item_id} does not belong to {owner_id}"
            )));
        }
        Ok(item)
    }
}

fn require_owner(owner_id: &str) -> Result<()> {
    require_id(owner_id, "owner_id")
}
