mod analyzer;
mod api;
mod cli;
mod config;
mod db;
mod entry;
mod registry;
mod slots;
mod store;

use crate::analyzer::report::{render_record_detail, render_record_line, render_stats, render_timeline};
use crate::analyzer::stats::derive_stats;
use crate::analyzer::timeline::TimelineProjector;
use crate::cli::prompt::{confirm_destructive, select_adjusted_time};
use crate::cli::{Cli, Commands, ConfigCommands, SlotArgs};
use crate::config::Config;
use crate::db::Database;
use crate::entry::EntryForm;
use crate::registry::{ActivityType, all_configs};
use crate::store::{ActivityRecord, ActivityStore, KeyValueStore};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            activity_type,
            slot,
            details,
            duration,
        } => handle_entry(
            EntryForm::Generic {
                activity_type,
                details,
                duration,
            },
            slot,
        ),
        Commands::Feed {
            slot,
            category,
            amount,
            notes,
        } => handle_entry(
            EntryForm::Feeding {
                category,
                amount_ml: amount,
                notes,
            },
            slot,
        ),
        Commands::Diaper {
            slot,
            kind,
            status,
            notes,
        } => handle_entry(EntryForm::Diaper { kind, status, notes }, slot),
        Commands::Sleep {
            slot,
            kind,
            minutes,
            notes,
        } => handle_entry(
            EntryForm::Sleep {
                kind,
                minutes,
                notes,
            },
            slot,
        ),
        Commands::List { activity_type } => handle_list(activity_type),
        Commands::Show { id } => handle_show(&id),
        Commands::Delete { id } => handle_delete(&id),
        Commands::Clear { activity_type, yes } => handle_clear(activity_type, yes),
        Commands::Reset { yes } => handle_reset(yes),
        Commands::Stats => handle_stats(),
        Commands::Timeline {
            activity_type,
            date,
        } => handle_timeline(activity_type, date),
        Commands::Types => {
            handle_types();
            Ok(())
        }
        Commands::Watch => handle_watch().await,
        Commands::Serve => handle_serve().await,
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
    }
}

fn handle_entry(form: EntryForm, placement: SlotArgs) -> Result<()> {
    let config = Config::load_or_init()?;
    let offset = config.display_offset();
    let now = config.now();
    let today = now.date_naive();

    let (slot, adjusted) = placement.resolve(select_adjusted_time)?;
    let record = form.place(slot, today, adjusted, now, &offset)?;

    let mut store = open_store(&config)?;
    store.add(record.clone())?;

    println!("Activity saved");
    println!("{}", render_record_line(&record, &offset));
    if let Some(tally) = derive_stats(store.all(), Some(now)).get(record.activity_type) {
        println!(
            "{} today: {}/{}",
            record.activity_type.config().name,
            tally.today_count,
            tally.target_frequency
        );
    }
    Ok(())
}

fn handle_list(activity_type: Option<ActivityType>) -> Result<()> {
    let config = Config::load_or_init()?;
    let offset = config.display_offset();
    let store = open_store(&config)?;

    let records = store
        .all()
        .iter()
        .filter(|record| activity_type.is_none_or(|wanted| record.activity_type == wanted))
        .collect::<Vec<_>>();

    if records.is_empty() {
        println!("No activities recorded");
        return Ok(());
    }

    for record in &records {
        println!("{}", render_record_line(record, &offset));
    }
    println!("{} activit{}", records.len(), if records.len() == 1 { "y" } else { "ies" });

    Ok(())
}

fn handle_show(id: &str) -> Result<()> {
    let config = Config::load_or_init()?;
    let store = open_store(&config)?;
    let record = store
        .find(id)
        .with_context(|| format!("No activity found: {id}"))?;

    println!("{}", render_record_detail(record, &config.display_offset()));
    Ok(())
}

fn handle_delete(id: &str) -> Result<()> {
    let config = Config::load_or_init()?;
    let mut store = open_store(&config)?;

    match store.remove_by_id(id)? {
        Some(record) => {
            println!("Activity deleted");
            println!("{}", render_record_line(&record, &config.display_offset()));
            Ok(())
        }
        None => bail!("No activity found: {id}"),
    }
}

fn handle_clear(activity_type: ActivityType, yes: bool) -> Result<()> {
    let label = activity_type.config().name;
    if !yes && !confirm_destructive(&format!("Delete every {label} record?"))? {
        println!("Cancelled");
        return Ok(());
    }

    let config = Config::load_or_init()?;
    let mut store = open_store(&config)?;
    let removed = store.remove_by_type(activity_type)?;

    println!("Removed {removed} {label} record(s)");
    Ok(())
}

fn handle_reset(yes: bool) -> Result<()> {
    if !yes && !confirm_destructive("Delete ALL recorded activities?")? {
        println!("Cancelled");
        return Ok(());
    }

    let config = Config::load_or_init()?;
    let mut store = open_store(&config)?;
    let removed = store.clear()?;

    println!("All data reset ({removed} record(s) removed)");
    Ok(())
}

fn handle_stats() -> Result<()> {
    let config = Config::load_or_init()?;
    let store = open_store(&config)?;
    let stats = derive_stats(store.all(), Some(config.now()));

    print!("{}", render_stats(&stats));
    Ok(())
}

fn handle_timeline(activity_type: ActivityType, date: Option<String>) -> Result<()> {
    let config = Config::load_or_init()?;
    let store = open_store(&config)?;

    let mut projector = TimelineProjector::new(config.display_offset());
    if let Some(day) = parse_optional_date(date)? {
        projector = projector.for_day(day);
    }
    let timeline = projector.project(store.all(), activity_type, Some(config.now()));

    print!("{}", render_timeline(&timeline));
    Ok(())
}

fn handle_types() {
    for (activity_type, config) in all_configs() {
        println!(
            "{} {:<9} {:<8} target {}/day  {}",
            config.icon,
            config.name,
            activity_type.as_str(),
            config.target_frequency,
            config.description
        );
    }
}

async fn handle_watch() -> Result<()> {
    let config = Config::load_or_init()?;
    let mut ticker = interval(Duration::from_secs(config.refresh_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(refresh_seconds = config.refresh_seconds, "watching daily stats");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Reloaded every tick so writes from other processes show up.
                let store = open_store(&config)?;
                let now = config.now();
                let stats = derive_stats(store.all(), Some(now));

                print!("\x1B[2J\x1B[H");
                println!("BabyTracker  {}", now.format("%Y-%m-%d %H:%M:%S"));
                println!();
                print!("{}", render_stats(&stats));
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

async fn handle_serve() -> Result<()> {
    let config = Config::load_or_init()?;
    let store = open_store(&config)?;

    tokio::select! {
        api_result = api::run_server(Arc::new(config), store) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_init()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_init()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = Config::load_or_init()?;
    let database = Database::open(&config.db_path)?;
    let last_write = database.updated_at(&config.storage_key)?;
    let store = ActivityStore::load(Box::new(database), &config.storage_key)?;
    let offset = config.display_offset();

    println!("BabyTracker status");
    println!("- db_path: {}", config.db_path.display());
    println!("- storage_key: {}", config.storage_key);
    println!("- activities: {}", store.len());
    println!(
        "- last_saved_at: {}",
        last_write
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .map(|timestamp| timestamp
                .with_timezone(&offset)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!("- display_offset: UTC{offset}");
    println!("- now: {}", config.now().format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = match Config::load_or_init() {
        Ok(config) => config,
        Err(error) => {
            println!("[WARN] config.json unreadable, checking defaults instead: {error:#}");
            issues.push("config unreadable".to_string());
            Config::default()
        }
    };

    match Database::open(&config.db_path) {
        Ok(database) => {
            println!("[OK] SQLite reachable: {}", config.db_path.display());
            match database.get(&config.storage_key) {
                Ok(None) => println!("[OK] no stored activities yet"),
                Ok(Some(raw)) => match serde_json::from_str::<Vec<ActivityRecord>>(&raw) {
                    Ok(records) => println!("[OK] stored activities parse: {} record(s)", records.len()),
                    Err(error) => {
                        println!("[WARN] stored activities are malformed and will load as empty: {error}");
                        issues.push("malformed activities".to_string());
                    }
                },
                Err(error) => {
                    println!("[WARN] failed to read stored activities: {error}");
                    issues.push("activities unreadable".to_string());
                }
            }
        }
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    println!("[OK] display offset: UTC{}", config.display_offset());

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<ActivityStore> {
    let database = Database::open(&config.db_path)?;
    ActivityStore::load(Box::new(database), &config.storage_key)
}

fn parse_optional_date(input: Option<String>) -> Result<Option<NaiveDate>> {
    input
        .as_deref()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format: {date}. Example: 2024-01-01"))
        })
        .transpose()
}
