//! Lossless integer encoding of `DateTime<Utc>`.
//!
//! An instant is split into whole seconds since the Unix epoch and the
//! nanoseconds within that second. Both parts together cover the full chrono
//! range, and `(secs, nanos)` pairs sort in time order.

use crate::error::{Result, SrsError};
use chrono::{DateTime, Utc};

pub fn split_timestamp(at: DateTime<Utc>) -> (i64, u32) {
    (at.timestamp(), at.timestamp_subsec_nanos())
}

pub fn join_timestamp(secs: i64, nanos: u32) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| SrsError::Validation(format!("timestamp {secs}.{nanos:09} is out of range")))
}
