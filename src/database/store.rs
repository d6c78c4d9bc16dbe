//! Storage contract for the scheduler and its SQLite implementation.

use super::db;
use crate::error::{Result, SrsError};
use crate::models::{DueCursor, ReviewEvent, SchedulableItem};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Durable per-item state plus an append-only review log.
///
/// Any backend offering conditional writes can implement this; the scheduler
/// never assumes more than what is listed here.
pub trait ItemStore: Send + Sync {
    fn insert_item(&self, item: &SchedulableItem) -> Result<()>;

    fn get_item(&self, item_id: &str) -> Result<Option<SchedulableItem>>;

    /// Writes `item` only if the stored version still equals
    /// `expected_version`, appending `event` in the same atomic unit.
    ///
    /// Returns `Ok(false)` when the version check fails; nothing is written
    /// in that case.
    fn commit_item(
        &self,
        item: &SchedulableItem,
        expected_version: u64,
        event: Option<&ReviewEvent>,
    ) -> Result<bool>;

    fn delete_item(&self, item_id: &str, purge_events: bool) -> Result<bool>;

    fn delete_items_for_content(&self, content_ref: &str, purge_events: bool) -> Result<usize>;

    fn query_due(
        &self,
        owner_id: &str,
        scope: Option<&str>,
        as_of: DateTime<Utc>,
        after: Option<&DueCursor>,
        limit: usize,
    ) -> Result<Vec<SchedulableItem>>;

    fn scan_items(
        &self,
        owner_id: &str,
        scope: Option<&str>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SchedulableItem>>;

    fn events_for_item(&self, item_id: &str, limit: usize) -> Result<Vec<ReviewEvent>>;
}

/// `ItemStore` backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SrsError::Storage("connection lock poisoned".into()))
    }
}

impl ItemStore for SqliteStore {
    fn insert_item(&self, item: &SchedulableItem) -> Result<()> {
        let conn = self.lock()?;
        db::insert_item(&conn, item)
    }

    fn get_item(&self, item_id: &str) -> Result<Option<SchedulableItem>> {
        let conn = self.lock()?;
        db::get_item(&conn, item_id)
    }

    fn commit_item(
        &self,
        item: &SchedulableItem,
        expected_version: u64,
        event: Option<&ReviewEvent>,
    ) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !db::update_item_if_version(&tx, item, expected_version)? {
            // dropping the transaction rolls it back
            return Ok(false);
        }
        if let Some(event) = event {
            db::insert_event(&tx, event)?;
        }

        tx.commit()?;
        Ok(true)
    }

    fn delete_item(&self, item_id: &str, purge_events: bool) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = db::delete_item(&tx, item_id, purge_events)?;
        tx.commit()?;
        Ok(removed)
    }

    fn delete_items_for_content(&self, content_ref: &str, purge_events: bool) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = db::delete_items_for_content(&tx, content_ref, purge_events)?;
        tx.commit()?;
        Ok(removed)
    }

    fn query_due(
        &self,
        owner_id: &str,
        scope: Option<&str>,
        as_of: DateTime<Utc>,
        after: Option<&DueCursor>,
        limit: usize,
    ) -> Result<Vec<SchedulableItem>> {
        let conn = self.lock()?;
        db::query_due(&conn, owner_id, scope, as_of, after, limit)
    }

    fn scan_items(
        &self,
        owner_id: &str,
        scope: Option<&str>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SchedulableItem>> {
        let conn = self.lock()?;
        db::scan_items(&conn, owner_id, scope, after_id, limit)
    }

    fn events_for_item(&self, item_id: &str, limit: usize) -> Result<Vec<ReviewEvent>> {
        let conn = self.lock()?;
        db::events_for_item(&conn, item_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quality;

    #[test]
    fn test_commit_is_atomic_on_event_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let item = SchedulableItem::new("alice", "card-1", None, 2.5, now);
        store.insert_item(&item).unwrap();

        let first = ReviewEvent::new(&item.id, "alice", Quality::MAX, now, 1, 2.6, None);
        let mut updated = item.clone();
        updated.version = 1;
        updated.repetitions = 1;
        assert!(store.commit_item(&updated, 0, Some(&first)).unwrap());

        // Same event id violates the primary key, so the item update must roll back too.
        let mut again = updated.clone();
        again.version = 2;
        again.repetitions = 2;
        assert!(store.commit_item(&again, 1, Some(&first)).is_err());

        let stored = store.get_item(&item.id).unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.repetitions, 1);
        assert_eq!(store.events_for_item(&item.id, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_version_mismatch_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let item = SchedulableItem::new("alice", "card-1", None, 2.5, now);
        store.insert_item(&item).unwrap();

        let event = ReviewEvent::new(&item.id, "alice", Quality::MIN, now, 0, 1.7, None);
        let mut updated = item.clone();
        updated.version = 4;
        assert!(!store.commit_item(&updated, 3, Some(&event)).unwrap());
        assert!(store.events_for_item(&item.id, 10).unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srs.sqlite3");
        let item = SchedulableItem::new("alice", "card-1", Some("deck"), 2.5, Utc::now());
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_item(&item).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get_item(&item.id).unwrap(), Some(item));
    }
}
