//! Per-owner statistics by chunked full scan.

use super::{Scheduler, require_owner};
use crate::database::ItemStore;
use crate::error::Result;
use crate::models::{Statistics, StatisticsAccumulator};
use chrono::{DateTime, Utc};
use log::debug;

impl<S: ItemStore> Scheduler<S> {
    pub fn compute_statistics(&self, owner_id: &str, scope: Option<&str>) -> Result<Statistics> {
        self.compute_statistics_at(owner_id, scope, Utc::now())
    }

    /// Due-ness uses the same rule as [`Scheduler::list_due_items`].
    pub fn compute_statistics_at(
        &self,
        owner_id: &str,
        scope: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> Result<Statistics> {
        require_owner(owner_id)?;
        let chunk_size = self.config.stats_chunk_size;
        let mut acc = StatisticsAccumulator::new(as_of);
        let mut after_id: Option<String> = None;
        let mut chunks = 0usize;

        loop {
            let chunk = self
                .store
                .scan_items(owner_id, scope, after_id.as_deref(), chunk_size)?;
            chunks += 1;
            for item in &chunk {
                acc.add(item);
            }
            if chunk.len() < chunk_size {
                break;
            }
            after_id = chunk.last().map(|item| item.id.clone());
        }

        let stats = acc.finish();
        debug!(
            "Statistics for {owner_id}: {} item(s), {} due, {chunks} chunk(s)",
            stats.total_items, stats.due_count
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::database::SqliteStore;
    use crate::models::ItemStatus;
    use crate::scheduler::test_support::scheduler;
    use crate::scheduler::{DueQuery, ReviewRequest};
    use chrono::Duration;

    #[test]
    fn test_empty_owner() {
        let stats = scheduler().compute_statistics("nobody", None).unwrap();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.due_count, 0);
        assert_eq!(stats.average_ease_factor, None);
    }

    #[test]
    fn test_counts_and_averages() {
        let s = scheduler();
        let t0 = Utc::now();
        let a = s.create_item("alice", "a", Some("deck")).unwrap();
        let b = s.create_item("alice", "b", Some("deck")).unwrap();
        let c = s.create_item("alice", "c", None).unwrap();
        s.create_item("bob", "a", None).unwrap();

        s.record_review(&ReviewRequest::new(&a.id, "alice", 5).at(t0)).unwrap();
        s.record_review(&ReviewRequest::new(&b.id, "alice", 0).at(t0)).unwrap();
        s.set_suspended(&c.id, "alice", true).unwrap();

        let as_of = t0 + Duration::minutes(1);
        let stats = s.compute_statistics_at("alice", None, as_of).unwrap();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.by_status[&ItemStatus::Reviewing], 1);
        assert_eq!(stats.by_status[&ItemStatus::Learning], 1);
        assert_eq!(stats.by_status[&ItemStatus::Suspended], 1);
        assert_eq!(stats.by_status[&ItemStatus::Mastered], 0);
        assert_eq!(stats.due_count, 1);
        assert_eq!(stats.total_lapses, 1);
        assert_eq!(stats.next_due_at, Some(t0 + Duration::days(1)));
        // (2.6 + 1.7 + 2.5) / 3
        assert!((stats.average_ease_factor.unwrap() - 6.8 / 3.0).abs() < 1e-9);
        assert!((stats.average_interval_days.unwrap() - 1.0 / 3.0).abs() < 1e-9);

        let scoped = s.compute_statistics_at("alice", Some("deck"), as_of).unwrap();
        assert_eq!(scoped.total_items, 2);
    }

    #[test]
    fn test_due_count_matches_due_listing_across_chunks() {
        let config = SchedulerConfig {
            stats_chunk_size: 2,
            ..SchedulerConfig::default()
        };
        let s = Scheduler::new(SqliteStore::open_in_memory().unwrap(), config).unwrap();
        let t0 = Utc::now();
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(s.create_item("alice", &format!("card-{n}"), None).unwrap().id);
        }
        s.record_review(&ReviewRequest::new(&ids[0], "alice", 4).at(t0)).unwrap();
        s.set_suspended(&ids[1], "alice", true).unwrap();

        let as_of = t0 + Duration::seconds(5);
        let stats = s.compute_statistics_at("alice", None, as_of).unwrap();
        let page = s
            .list_due_items("alice", &DueQuery { as_of: Some(as_of), ..Default::default() })
            .unwrap();
        assert_eq!(stats.total_items, 5);
        assert_eq!(stats.due_count, page.items.len());
        assert_eq!(stats.due_count, 3);
    }
}
