pub mod prompt;

use crate::config::parse_hhmm;
use crate::entry::{DiaperKind, DiaperStatus, FeedingCategory, SleepKind};
use crate::registry::ActivityType;
use crate::slots::Slot;
use anyhow::{Result, bail};
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "BabyTracker",
    about = "Infant care activity logger with 10-minute daily timelines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where a new entry lands: a clicked slot (with optional adjusted time) or now.
#[derive(Debug, Args)]
pub struct SlotArgs {
    /// Slot index 0-143 on today's timeline
    #[arg(long)]
    pub slot: Option<usize>,
    /// Adjusted time (HH:MM) overriding the slot's nominal time
    #[arg(long)]
    pub at: Option<String>,
    /// Pick the time interactively from the slot's adjustment window
    #[arg(long, default_value_t = false)]
    pub adjust: bool,
}

impl SlotArgs {
    /// Validated slot and adjusted time. `pick` supplies the time when
    /// `--adjust` is set and no `--at` was given.
    pub fn resolve<F>(&self, pick: F) -> Result<(Option<Slot>, Option<NaiveTime>)>
    where
        F: FnOnce(Slot) -> Result<NaiveTime>,
    {
        let slot = self.slot.map(Slot::parse_index).transpose()?;
        let at = self.at.as_deref().map(parse_hhmm).transpose()?;

        match (slot, at) {
            (None, _) if self.adjust => bail!("--adjust requires --slot"),
            (Some(slot), None) if self.adjust => Ok((Some(slot), Some(pick(slot)?))),
            _ => Ok((slot, at)),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Add {
        activity_type: ActivityType,
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long)]
        details: Option<String>,
        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,
    },
    Feed {
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long, value_enum)]
        category: FeedingCategory,
        /// Amount in ml
        #[arg(long)]
        amount: u32,
        #[arg(long)]
        notes: Option<String>,
    },
    Diaper {
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long, value_enum)]
        kind: DiaperKind,
        #[arg(long, value_enum, default_value_t = DiaperStatus::Normal)]
        status: DiaperStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    Sleep {
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long, value_enum)]
        kind: SleepKind,
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long = "type")]
        activity_type: Option<ActivityType>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
    Clear {
        activity_type: ActivityType,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Reset {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Stats,
    Timeline {
        activity_type: ActivityType,
        /// Restrict to one day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    Types,
    Watch,
    Serve,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
