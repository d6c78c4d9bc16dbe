//! SQLite persistence for scheduling state
//!
//! Handles schema initialization, row mapping and the individual statements
//! behind the item store. Every function takes a plain `&Connection`, so it
//! can run inside a transaction as well.
//!
//! Timestamps are stored as two integer columns, whole seconds since the
//! Unix epoch (`<name>`) and the nanoseconds within that second
//! (`<name>_ns`). That keeps full `DateTime<Utc>` precision over chrono's
//! whole range and sorts correctly when ordered by both columns.

use crate::error::{Result, SrsError};
use crate::models::timestamp::{join_timestamp, split_timestamp};
use crate::models::{DueCursor, ItemStatus, Quality, ReviewEvent, SchedulableItem};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

const ITEM_COLUMNS: &str = "id, owner_id, content_ref, scope, status, resume_status, ease_factor, \
     interval_days, repetitions, lapses, last_reviewed_at, last_reviewed_at_ns, next_review_at, \
     next_review_at_ns, created_at, created_at_ns, updated_at, updated_at_ns, version";

const EVENT_COLUMNS: &str = "id, item_id, owner_id, quality, occurred_at, occurred_at_ns, \
     resulting_interval_days, resulting_ease_factor, response_time_ms";

/// Creates the item and review-event tables and their indexes.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            content_ref TEXT NOT NULL,
            scope TEXT,
            status TEXT NOT NULL,
            resume_status TEXT,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            lapses INTEGER NOT NULL DEFAULT 0,
            last_reviewed_at INTEGER,
            last_reviewed_at_ns INTEGER,
            next_review_at INTEGER,
            next_review_at_ns INTEGER,
            created_at INTEGER NOT NULL,
            created_at_ns INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            updated_at_ns INTEGER NOT NULL,
            version INTEGER NOT NULL DEFAULT 0,
            UNIQUE (owner_id, content_ref)
        );
        CREATE INDEX IF NOT EXISTS idx_items_owner_due
            ON items (owner_id, status, next_review_at, next_review_at_ns, id);
        CREATE INDEX IF NOT EXISTS idx_items_content ON items (content_ref);

        CREATE TABLE IF NOT EXISTS review_events (
            id TEXT PRIMARY KEY,
            item_id TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            quality INTEGER NOT NULL CHECK (quality BETWEEN 0 AND 5),
            occurred_at INTEGER NOT NULL,
            occurred_at_ns INTEGER NOT NULL,
            resulting_interval_days INTEGER NOT NULL,
            resulting_ease_factor REAL NOT NULL,
            response_time_ms INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_events_item
            ON review_events (item_id, occurred_at, occurred_at_ns);",
    )?;
    Ok(())
}

fn opt_split(at: Option<DateTime<Utc>>) -> (Option<i64>, Option<u32>) {
    match at {
        Some(at) => {
            let (secs, nanos) = split_timestamp(at);
            (Some(secs), Some(nanos))
        }
        None => (None, None),
    }
}

fn conversion_error(idx: usize, e: SrsError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Reads the timestamp stored at columns `idx` (seconds) and `idx + 1` (nanos).
fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    join_timestamp(row.get(idx)?, row.get(idx + 1)?).map_err(|e| conversion_error(idx, e))
}

fn opt_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match (row.get::<_, Option<i64>>(idx)?, row.get::<_, Option<u32>>(idx + 1)?) {
        (Some(secs), Some(nanos)) => join_timestamp(secs, nanos)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        _ => Ok(None),
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<SchedulableItem> {
    let status: String = row.get(4)?;
    let resume_status: Option<String> = row.get(5)?;
    let version: i64 = row.get(18)?;

    Ok(SchedulableItem {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        content_ref: row.get(2)?,
        scope: row.get(3)?,
        status: status.parse().map_err(|e| conversion_error(4, e))?,
        resume_status: resume_status
            .map(|s| s.parse::<ItemStatus>())
            .transpose()
            .map_err(|e| conversion_error(5, e))?,
        ease_factor: row.get(6)?,
        interval_days: row.get(7)?,
        repetitions: row.get(8)?,
        lapses: row.get(9)?,
        last_reviewed_at: opt_timestamp_at(row, 10)?,
        next_review_at: opt_timestamp_at(row, 12)?,
        created_at: timestamp_at(row, 14)?,
        updated_at: timestamp_at(row, 16)?,
        version: version as u64,
    })
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<ReviewEvent> {
    let quality: i64 = row.get(3)?;
    let response_time_ms: Option<i64> = row.get(8)?;

    Ok(ReviewEvent {
        id: row.get(0)?,
        item_id: row.get(1)?,
        owner_id: row.get(2)?,
        quality: Quality::new(quality).map_err(|e| conversion_error(3, e))?,
        occurred_at: timestamp_at(row, 4)?,
        resulting_interval_days: row.get(6)?,
        resulting_ease_factor: row.get(7)?,
        response_time_ms: response_time_ms.map(|ms| ms as u64),
    })
}

/// Inserts a new item.
///
/// Fails with `Conflict` when the id, or the owner's item for the same
/// content, already exists.
pub fn insert_item(conn: &Connection, item: &SchedulableItem) -> Result<()> {
    let (last_reviewed_at, last_reviewed_at_ns) = opt_split(item.last_reviewed_at);
    let (next_review_at, next_review_at_ns) = opt_split(item.next_review_at);
    let (created_at, created_at_ns) = split_timestamp(item.created_at);
    let (updated_at, updated_at_ns) = split_timestamp(item.updated_at);

    let result = conn.execute(
        &format!(
            "INSERT INTO items ({ITEM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            item.id,
            item.owner_id,
            item.content_ref,
            item.scope,
            item.status.as_str(),
            item.resume_status.map(ItemStatus::as_str),
            item.ease_factor,
            item.interval_days,
            item.repetitions,
            item.lapses,
            last_reviewed_at,
            last_reviewed_at_ns,
            next_review_at,
            next_review_at_ns,
            created_at,
            created_at_ns,
            updated_at,
            updated_at_ns,
            item.version as i64,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(SrsError::Conflict(format!(
                "owner '{}' already has an item for content '{}'",
                item.owner_id, item.content_ref
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_item(conn: &Connection, item_id: &str) -> Result<Option<SchedulableItem>> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            params![item_id],
            row_to_item,
        )
        .optional()?;
    Ok(item)
}

/// Overwrites the mutable fields of `item` only if the stored version is
/// still `expected_version`. Returns whether a row was written.
pub fn update_item_if_version(
    conn: &Connection,
    item: &SchedulableItem,
    expected_version: u64,
) -> Result<bool> {
    let (last_reviewed_at, last_reviewed_at_ns) = opt_split(item.last_reviewed_at);
    let (next_review_at, next_review_at_ns) = opt_split(item.next_review_at);
    let (updated_at, updated_at_ns) = split_timestamp(item.updated_at);

    let changed = conn.execute(
        "UPDATE items
         SET status = ?1, resume_status = ?2, ease_factor = ?3, interval_days = ?4,
             repetitions = ?5, lapses = ?6, last_reviewed_at = ?7, last_reviewed_at_ns = ?8,
             next_review_at = ?9, next_review_at_ns = ?10, updated_at = ?11, updated_at_ns = ?12,
             version = ?13
         WHERE id = ?14 AND version = ?15",
        params![
            item.status.as_str(),
            item.resume_status.map(ItemStatus::as_str),
            item.ease_factor,
            item.interval_days,
            item.repetitions,
            item.lapses,
            last_reviewed_at,
            last_reviewed_at_ns,
            next_review_at,
            next_review_at_ns,
            updated_at,
            updated_at_ns,
            item.version as i64,
            item.id,
            expected_version as i64,
        ],
    )?;
    Ok(changed == 1)
}

pub fn insert_event(conn: &Connection, event: &ReviewEvent) -> Result<()> {
    let (occurred_at, occurred_at_ns) = split_timestamp(event.occurred_at);
    conn.execute(
        &format!("INSERT INTO review_events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            event.id,
            event.item_id,
            event.owner_id,
            event.quality.value(),
            occurred_at,
            occurred_at_ns,
            event.resulting_interval_days,
            event.resulting_ease_factor,
            event.response_time_ms.map(|ms| ms as i64),
        ],
    )?;
    Ok(())
}

/// Deletes one item, and its review events when `purge_events` is set.
pub fn delete_item(conn: &Connection, item_id: &str, purge_events: bool) -> Result<bool> {
    if purge_events {
        conn.execute("DELETE FROM review_events WHERE item_id = ?1", params![item_id])?;
    }
    let removed = conn.execute("DELETE FROM items WHERE id = ?1", params![item_id])?;
    Ok(removed > 0)
}

/// Deletes every item tracking `content_ref`, across all owners.
pub fn delete_items_for_content(conn: &Connection, content_ref: &str, purge_events: bool) -> Result<usize> {
    if purge_events {
        conn.execute(
            "DELETE FROM review_events
             WHERE item_id IN (SELECT id FROM items WHERE content_ref = ?1)",
            params![content_ref],
        )?;
    }
    let removed = conn.execute("DELETE FROM items WHERE content_ref = ?1", params![content_ref])?;
    Ok(removed)
}

/// Due items of `owner_id`, ordered by `(next_review_at, id)`, strictly after
/// `after` when given.
pub fn query_due(
    conn: &Connection,
    owner_id: &str,
    scope: Option<&str>,
    as_of: DateTime<Utc>,
    after: Option<&DueCursor>,
    limit: usize,
) -> Result<Vec<SchedulableItem>> {
    let (as_of_secs, as_of_nanos) = split_timestamp(as_of);
    let (after_secs, after_nanos) = opt_split(after.map(|c| c.next_review_at));
    let after_id = after.map(|c| c.item_id.as_str());

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items
         WHERE owner_id = ?1
           AND status != 'SUSPENDED'
           AND next_review_at IS NOT NULL
           AND (next_review_at < ?2 OR (next_review_at = ?2 AND next_review_at_ns <= ?3))
           AND (?4 IS NULL OR scope = ?4)
           AND (?5 IS NULL
                OR next_review_at > ?5
                OR (next_review_at = ?5 AND next_review_at_ns > ?6)
                OR (next_review_at = ?5 AND next_review_at_ns = ?6 AND id > ?7))
         ORDER BY next_review_at ASC, next_review_at_ns ASC, id ASC
         LIMIT ?8"
    ))?;

    let items = stmt
        .query_map(
            params![
                owner_id,
                as_of_secs,
                as_of_nanos,
                scope,
                after_secs,
                after_nanos,
                after_id,
                limit as i64
            ],
            row_to_item,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

/// All items of `owner_id` in id order, one chunk at a time.
pub fn scan_items(
    conn: &Connection,
    owner_id: &str,
    scope: Option<&str>,
    after_id: Option<&str>,
    limit: usize,
) -> Result<Vec<SchedulableItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items
         WHERE owner_id = ?1
           AND (?2 IS NULL OR scope = ?2)
           AND (?3 IS NULL OR id > ?3)
         ORDER BY id ASC
         LIMIT ?4"
    ))?;

    let items = stmt
        .query_map(params![owner_id, scope, after_id, limit as i64], row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

/// Review history of one item, newest first.
pub fn events_for_item(conn: &Connection, item_id: &str, limit: usize) -> Result<Vec<ReviewEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM review_events
         WHERE item_id = ?1
         ORDER BY occurred_at DESC, occurred_at_ns DESC, id DESC
         LIMIT ?2"
    ))?;

    let events = stmt
        .query_map(params![item_id, limit as i64], row_to_event)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(events)
}
