pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fetchers;
pub mod http;
pub mod pagination;
pub mod rate_limiter;
pub mod resolver;
pub mod services;
pub mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::Colorize;

use crate::cli::Command;
use crate::config::{AppConfig, StaticConfig};
use crate::domain::{AggregatedResult, DateSlotMap, Sport};
use crate::services::{IngestionService, ServerService};
use crate::storage::Storage;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::from_env();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_fetch(sport: Option<Sport>) -> Result<()> {
    let sports = match sport {
        Some(sport) => vec![sport],
        None => Sport::ALL.to_vec(),
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut service = IngestionService::new(AppConfig::from_env())?;
        service.run(&sports).await
    })
}

pub fn handle_show(sport: Sport, venue: Option<&str>) -> Result<()> {
    let config = AppConfig::from_env();
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        let storage = Storage::from_settings(&config.storage, &config.scraper)?;
        storage.load(sport).await
    })?;

    let Some(result) = result else {
        println!("{}", format!("No {} slots saved yet", sport).yellow());
        return Ok(());
    };
    print_result(&result, venue);
    Ok(())
}

pub fn handle_resolve(text: &str, debug: bool, threshold: Option<f64>) -> Result<()> {
    let config = AppConfig::from_env();
    let static_config = StaticConfig::load(&config.registry)?;
    let threshold = threshold.unwrap_or(config.resolver.threshold);

    match static_config.resolver.resolve(text, threshold) {
        Some(found) => println!(
            "{} {} ({:.3})",
            found.venue_id.green().bold(),
            found.name,
            found.score
        ),
        None => println!("{}", format!("No venue matches {:?}", text).yellow()),
    }

    if debug {
        for candidate in static_config.resolver.rank(text, config.resolver.debug_top) {
            println!("  {:<32} {:.3}  {}", candidate.venue_id, candidate.score, candidate.name.dimmed());
        }
    }
    Ok(())
}

fn print_result(result: &AggregatedResult, only_venue: Option<&str>) {
    println!(
        "Updated {}, {} slots",
        result.last_updated.to_rfc3339().bold(),
        result.total_slots()
    );
    for (venue_id, dates) in &result.sites {
        if only_venue.is_some_and(|only| only != venue_id) {
            continue;
        }
        let status = result.status.get(venue_id);
        let header = match status {
            Some(status) if !status.is_complete() => format!(
                "{} ({} units failed: {})",
                venue_id,
                status.units_failed,
                status.failed_units.join(", ")
            )
            .red(),
            _ => venue_id.as_str().green(),
        };
        println!("\n{}", header.bold());
        print_dates(dates);
    }
}

fn print_dates(dates: &DateSlotMap) {
    if dates.is_empty() {
        println!("  {}", "no free slots".dimmed());
    }
    for (date, slots) in dates {
        let times: Vec<String> = slots
            .iter()
            .map(|slot| match slot.price {
                Some(price) => format!("{} {}′ {}₽", slot.time, slot.duration, price),
                None => format!("{} {}′", slot.time, slot.duration),
            })
            .collect();
        println!("  {}  {}", date.cyan(), times.join(" | "));
    }
}
