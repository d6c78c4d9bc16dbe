pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod scheduler;

pub use config::{AppConfig, SchedulerConfig, SchedulingPolicy};
pub use database::{ItemStore, SqliteStore};
pub use error::{Result, SrsError};
pub use models::{DueCursor, DuePage, ItemStatus, Quality, ReviewEvent, ReviewRating, SchedulableItem, Statistics};
pub use scheduler::{DueQuery, HistoryPolicy, ReviewPreview, ReviewRequest, Scheduler};
