//! Aggregate view over one owner's items.
use super::{ItemStatus, SchedulableItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_items: usize,
    /// Every status is present, zero-count ones included.
    pub by_status: BTreeMap<ItemStatus, usize>,
    pub due_count: usize,
    /// `None` when there are no items.
    pub average_ease_factor: Option<f64>,
    pub average_interval_days: Option<f64>,
    pub total_lapses: u64,
    /// Earliest upcoming review strictly after the evaluation time.
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Running totals folded one chunk of items at a time.
#[derive(Debug)]
pub struct StatisticsAccumulator {
    as_of: DateTime<Utc>,
    total_items: usize,
    by_status: BTreeMap<ItemStatus, usize>,
    due_count: usize,
    ease_sum: f64,
    interval_sum: u64,
    total_lapses: u64,
    next_due_at: Option<DateTime<Utc>>,
}

impl StatisticsAccumulator {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            total_items: 0,
            by_status: ItemStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            due_count: 0,
            ease_sum: 0.0,
            interval_sum: 0,
            total_lapses: 0,
            next_due_at: None,
        }
    }

    pub fn add(&mut self, item: &SchedulableItem) {
        self.total_items += 1;
        *self.by_status.entry(item.status).or_insert(0) += 1;
        self.ease_sum += item.ease_factor;
        self.interval_sum += u64::from(item.interval_days);
        self.total_lapses += u64::from(item.lapses);

        if item.is_due(self.as_of) {
            self.due_count += 1;
        } else if item.status != ItemStatus::Suspended {
            if let Some(at) = item.next_review_at {
                self.next_due_at = Some(self.next_due_at.map_or(at, |cur| cur.min(at)));
            }
        }
    }

    pub fn finish(self) -> Statistics {
        let n = self.total_items as f64;
        let average = |sum: f64| (self.total_items > 0).then(|| sum / n);
        Statistics {
            total_items: self.total_items,
            average_ease_factor: average(self.ease_sum),
            average_interval_days: average(self.interval_sum as f64),
            by_status: self.by_status,
            due_count: self.due_count,
            total_lapses: self.total_lapses,
            next_due_at: self.next_due_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_empty_statistics() {
        let stats = StatisticsAccumulator::new(Utc::now()).finish();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.by_status.len(), 4);
        assert!(stats.by_status.values().all(|&c| c == 0));
        assert_eq!(stats.average_ease_factor, None);
        assert_eq!(stats.next_due_at, None);
    }

    #[test]
    fn test_accumulates_items() {
        let now = Utc::now();
        let due = SchedulableItem::new("alice", "a", None, 2.5, now - Duration::hours(1));
        let mut later = SchedulableItem::new("alice", "b", None, 2.0, now);
        later.status = ItemStatus::Reviewing;
        later.interval_days = 6;
        later.lapses = 2;
        later.next_review_at = Some(now + Duration::days(6));
        let suspended = SchedulableItem::new("alice", "c", None, 1.5, now).suspended(now);

        let mut acc = StatisticsAccumulator::new(now);
        for item in [&due, &later, &suspended] {
            acc.add(item);
        }
        let stats = acc.finish();

        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.due_count, 1);
        assert_eq!(stats.by_status[&ItemStatus::Learning], 1);
        assert_eq!(stats.by_status[&ItemStatus::Reviewing], 1);
        assert_eq!(stats.by_status[&ItemStatus::Suspended], 1);
        assert!((stats.average_ease_factor.unwrap() - 2.0).abs() < 1e-9);
        assert!((stats.average_interval_days.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(stats.total_lapses, 2);
        assert_eq!(stats.next_due_at, Some(now + Duration::days(6)));
    }
}
