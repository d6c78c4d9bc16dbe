//! Terminal output for the `srs` binary.

use crate::OutputFormat;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use srs_engine::models::sm2::format_interval;
use srs_engine::{DuePage, ReviewEvent, ReviewPreview, SchedulableItem, Statistics};

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn item_line(item: &SchedulableItem) -> String {
    format!(
        "{}  {:<9}  content={}  EF {:.2}  interval {}  reps {}  lapses {}  next {}",
        item.id,
        item.status,
        item.content_ref,
        item.ease_factor,
        format_interval(item.interval_days),
        item.repetitions,
        item.lapses,
        format_time(item.next_review_at),
    )
}

pub fn item(item: &SchedulableItem, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(item),
        OutputFormat::Plain => {
            println!("{}", item_line(item));
            Ok(())
        }
    }
}

pub fn review(item: &SchedulableItem, event: &ReviewEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "item": item, "event": event })),
        OutputFormat::Plain => {
            println!(
                "Recorded quality {} at {} (event {})",
                event.quality,
                format_time(Some(event.occurred_at)),
                event.id
            );
            println!("{}", item_line(item));
            Ok(())
        }
    }
}

pub fn due_page(page: &DuePage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(page),
        OutputFormat::Plain => {
            if page.items.is_empty() {
                println!("Nothing due.");
            }
            for item in &page.items {
                println!("{}", item_line(item));
            }
            if let Some(cursor) = &page.next_cursor {
                println!("More due items: --cursor {cursor}");
            }
            Ok(())
        }
    }
}

pub fn statistics(stats: &Statistics, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(stats),
        OutputFormat::Plain => {
            println!("Items:          {}", stats.total_items);
            for (status, count) in &stats.by_status {
                println!("  {:<12}  {}", status.as_str(), count);
            }
            println!("Due now:        {}", stats.due_count);
            match (stats.average_ease_factor, stats.average_interval_days) {
                (Some(ef), Some(interval)) => {
                    println!("Average EF:     {ef:.2}");
                    println!("Avg interval:   {interval:.1} days");
                }
                _ => println!("Averages:       -"),
            }
            println!("Total lapses:   {}", stats.total_lapses);
            println!("Next due:       {}", format_time(stats.next_due_at));
            Ok(())
        }
    }
}

pub fn history(events: &[ReviewEvent], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(events),
        OutputFormat::Plain => {
            if events.is_empty() {
                println!("No reviews yet.");
            }
            for event in events {
                let response = event
                    .response_time_ms
                    .map(|ms| format!("  {ms} ms"))
                    .unwrap_or_default();
                println!(
                    "{}  q={}  -> interval {}  EF {:.2}{}",
                    format_time(Some(event.occurred_at)),
                    event.quality,
                    format_interval(event.resulting_interval_days),
                    event.resulting_ease_factor,
                    response,
                );
            }
            Ok(())
        }
    }
}

pub fn previews(previews: &[ReviewPreview], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(previews),
        OutputFormat::Plain => {
            for p in previews {
                println!(
                    "q={}  {:<9}  interval {:<4}  EF {:.2}",
                    p.quality,
                    p.status,
                    format_interval(p.interval_days),
                    p.ease_factor,
                );
            }
            Ok(())
        }
    }
}
