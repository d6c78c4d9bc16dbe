//! Scheduler and application configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! `SRS_*` environment variables. Every field has a default.

use crate::error::{Result, SrsError};
use crate::models::sm2::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables of the scheduling algorithm itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Consecutive successes needed for REVIEWING → MASTERED.
    pub mastery_threshold: u32,
    /// Interval assigned on a lapse; 0 means due immediately.
    pub lapse_interval_days: u32,
    pub initial_ease_factor: f64,
    /// Upper bound on any scheduled interval.
    pub max_interval_days: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            mastery_threshold: 3,
            lapse_interval_days: 0,
            initial_ease_factor: DEFAULT_EASE_FACTOR,
            max_interval_days: 36_500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub scheduling: SchedulingPolicy,
    /// Optimistic commit attempts before a review fails with a conflict.
    pub max_commit_attempts: u32,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Items read per chunk when aggregating statistics.
    pub stats_chunk_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduling: SchedulingPolicy::default(),
            max_commit_attempts: 5,
            default_page_size: 50,
            max_page_size: 500,
            stats_chunk_size: 500,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scheduling.mastery_threshold == 0 {
            return Err(SrsError::Config("mastery_threshold must be at least 1".into()));
        }
        if !(self.scheduling.initial_ease_factor >= MIN_EASE_FACTOR) {
            return Err(SrsError::Config(format!(
                "initial_ease_factor must be at least {MIN_EASE_FACTOR}"
            )));
        }
        if self.scheduling.max_interval_days == 0 {
            return Err(SrsError::Config("max_interval_days must be at least 1".into()));
        }
        if self.scheduling.lapse_interval_days > self.scheduling.max_interval_days {
            return Err(SrsError::Config(
                "lapse_interval_days must not exceed max_interval_days".into(),
            ));
        }
        if self.max_commit_attempts == 0 {
            return Err(SrsError::Config("max_commit_attempts must be at least 1".into()));
        }
        if self.default_page_size == 0 || self.max_page_size < self.default_page_size {
            return Err(SrsError::Config(
                "page sizes must satisfy 0 < default_page_size <= max_page_size".into(),
            ));
        }
        if self.stats_chunk_size == 0 {
            return Err(SrsError::Config("stats_chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration of the `srs` binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("srs.sqlite3"),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path` when given, applies environment overrides, validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    SrsError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.scheduler.validate()?;
        Ok(config)
    }

    /// Applies `SRS_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SRS_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(v) = parse_override(&lookup, "SRS_MASTERY_THRESHOLD")? {
            self.scheduler.scheduling.mastery_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, "SRS_LAPSE_INTERVAL_DAYS")? {
            self.scheduler.scheduling.lapse_interval_days = v;
        }
        if let Some(v) = parse_override(&lookup, "SRS_MAX_INTERVAL_DAYS")? {
            self.scheduler.scheduling.max_interval_days = v;
        }
        if let Some(v) = parse_override(&lookup, "SRS_MAX_COMMIT_ATTEMPTS")? {
            self.scheduler.max_commit_attempts = v;
        }
        Ok(())
    }
}

fn parse_override<F>(lookup: &F, key: &str) -> Result<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| SrsError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
        })
        .transpose()
}
