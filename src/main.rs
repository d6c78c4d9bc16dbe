mod render;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use srs_engine::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "srs", about = "Spaced-repetition scheduler", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum RatingArg {
    Bad,
    Difficult,
    Good,
    Easy,
}

impl From<RatingArg> for ReviewRating {
    fn from(arg: RatingArg) -> Self {
        match arg {
            RatingArg::Bad => ReviewRating::Bad,
            RatingArg::Difficult => ReviewRating::Difficult,
            RatingArg::Good => ReviewRating::Good,
            RatingArg::Easy => ReviewRating::Easy,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start tracking a piece of content for a learner
    Add {
        #[arg(long)]
        owner: String,
        /// Flashcard, question or notebook entry id
        #[arg(long)]
        content: String,
        /// Deck or notebook the content belongs to
        #[arg(long)]
        scope: Option<String>,
    },

    /// Record a review
    Review {
        item: String,
        #[arg(long)]
        owner: String,
        /// Recall quality 0-5
        #[arg(long, conflicts_with = "rating", required_unless_present = "rating", allow_hyphen_values = true)]
        quality: Option<i64>,
        /// Four-button rating instead of a 0-5 quality
        #[arg(long)]
        rating: Option<RatingArg>,
        /// When the review happened (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        response_ms: Option<u64>,
    },

    /// List items due for review
    Due {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Cursor printed by a previous page
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Show review statistics
    Stats {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        scope: Option<String>,
    },

    /// Suspend an item so it is never due
    Suspend {
        item: String,
        #[arg(long)]
        owner: String,
    },

    /// Return a suspended item to its previous status
    Unsuspend {
        item: String,
        #[arg(long)]
        owner: String,
    },

    /// Show the review history of an item
    History {
        item: String,
        #[arg(long)]
        owner: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show what each quality would do to an item
    Preview {
        item: String,
        #[arg(long)]
        owner: String,
    },

    /// Delete an item
    Delete {
        item: String,
        /// Delete its review history as well
        #[arg(long)]
        purge: bool,
    },

    /// Delete every item tracking a piece of content
    DeleteContent {
        content: String,
        #[arg(long)]
        purge: bool,
    },
}

fn history_policy(purge: bool) -> HistoryPolicy {
    if purge {
        HistoryPolicy::Purge
    } else {
        HistoryPolicy::Retain
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let scheduler = Scheduler::new(store, config.scheduler)?;
    let format = cli.format;

    match cli.command {
        Command::Add { owner, content, scope } => {
            let item = scheduler.create_item(&owner, &content, scope.as_deref())?;
            render::item(&item, format)?;
        }
        Command::Review {
            item,
            owner,
            quality,
            rating,
            at,
            response_ms,
        } => {
            let quality = match (quality, rating) {
                (Some(q), _) => q,
                (None, Some(rating)) => i64::from(ReviewRating::from(rating).to_quality().value()),
                (None, None) => anyhow::bail!("either --quality or --rating is required"),
            };
            let mut request = ReviewRequest::new(item, owner, quality);
            request.occurred_at = at;
            request.response_time_ms = response_ms;
            let (item, event) = scheduler.record_review(&request)?;
            render::review(&item, &event, format)?;
        }
        Command::Due {
            owner,
            scope,
            limit,
            cursor,
        } => {
            let query = DueQuery {
                scope,
                as_of: None,
                limit,
                cursor: cursor.map(|c| c.parse()).transpose()?,
            };
            let page = scheduler.list_due_items(&owner, &query)?;
            render::due_page(&page, format)?;
        }
        Command::Stats { owner, scope } => {
            let stats = scheduler.compute_statistics(&owner, scope.as_deref())?;
            render::statistics(&stats, format)?;
        }
        Command::Suspend { item, owner } => {
            let item = scheduler.set_suspended(&item, &owner, true)?;
            render::item(&item, format)?;
        }
        Command::Unsuspend { item, owner } => {
            let item = scheduler.set_suspended(&item, &owner, false)?;
            render::item(&item, format)?;
        }
        Command::History { item, owner, limit } => {
            let events = scheduler.review_history(&item, &owner, limit)?;
            render::history(&events, format)?;
        }
        Command::Preview { item, owner } => {
            let previews = scheduler.preview_review(&item, &owner)?;
            render::previews(&previews, format)?;
        }
        Command::Delete { item, purge } => {
            scheduler.delete_item(&item, history_policy(purge))?;
            println!("Deleted item {item}");
        }
        Command::DeleteContent { content, purge } => {
            let removed = scheduler.delete_items_for_content(&content, history_policy(purge))?;
            println!("Deleted {removed} item(s) for content {content}");
        }
    }

    Ok(())
}
