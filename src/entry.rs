use crate::registry::ActivityType;
use crate::slots::{AdjustmentWindow, Slot};
use crate::store::ActivityRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedingCategory {
    Milk,
    Food,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiaperKind {
    Wet,
    Dirty,
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiaperStatus {
    #[default]
    Normal,
    Unusual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SleepKind {
    Nap,
    Night,
}

/// Input collected by a data-entry form after a slot is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum EntryForm {
    Feeding {
        category: FeedingCategory,
        amount_ml: u32,
        #[serde(default)]
        notes: Option<String>,
    },
    Diaper {
        kind: DiaperKind,
        #[serde(default)]
        status: DiaperStatus,
        #[serde(default)]
        notes: Option<String>,
    },
    Sleep {
        kind: SleepKind,
        minutes: u32,
        #[serde(default)]
        notes: Option<String>,
    },
    Generic {
        #[serde(rename = "type", deserialize_with = "crate::registry::deserialize_strict")]
        activity_type: ActivityType,
        #[serde(default)]
        details: Option<String>,
        #[serde(default)]
        duration: Option<u32>,
    },
}

impl EntryForm {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            EntryForm::Feeding { .. } => ActivityType::Feeding,
            EntryForm::Diaper { .. } => ActivityType::Diaper,
            EntryForm::Sleep { .. } => ActivityType::Sleep,
            EntryForm::Generic { activity_type, .. } => *activity_type,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            EntryForm::Feeding {
                category,
                amount_ml,
                notes,
            } => {
                let category = match category {
                    FeedingCategory::Milk => "Milk",
                    FeedingCategory::Food => "Food",
                    FeedingCategory::Water => "Water",
                };
                Some(with_notes(format!("{category} {amount_ml}ml"), notes))
            }
            EntryForm::Diaper {
                kind,
                status,
                notes,
            } => {
                let kind = match kind {
                    DiaperKind::Wet => "Wet",
                    DiaperKind::Dirty => "Dirty",
                    DiaperKind::Both => "Wet + dirty",
                };
                let status = match status {
                    DiaperStatus::Normal => "normal",
                    DiaperStatus::Unusual => "unusual",
                };
                Some(with_notes(format!("{kind} ({status})"), notes))
            }
            EntryForm::Sleep {
                kind,
                minutes,
                notes,
            } => {
                let kind = match kind {
                    SleepKind::Nap => "Nap",
                    SleepKind::Night => "Night sleep",
                };
                Some(with_notes(
                    format!("{kind} {}", format_minutes(*minutes)),
                    notes,
                ))
            }
            EntryForm::Generic { details, .. } => details.clone(),
        }
    }

    pub fn duration(&self) -> Option<u32> {
        match self {
            EntryForm::Sleep { minutes, .. } => Some(*minutes),
            EntryForm::Generic { duration, .. } => *duration,
            _ => None,
        }
    }

    /// Builds the record for a clicked slot on `day`.
    ///
    /// The slot's nominal time is used unless the form supplies an adjusted
    /// time. Adjustments outside the slot's window are still accepted.
    pub fn finalize(
        &self,
        slot: Slot,
        day: NaiveDate,
        adjusted: Option<NaiveTime>,
        offset: &FixedOffset,
    ) -> Result<ActivityRecord> {
        let window = AdjustmentWindow::for_slot(slot);
        let time = match adjusted {
            Some(time) if !window.contains(time) => {
                warn!(
                    slot = %slot.label(),
                    adjusted = %time.format("%H:%M"),
                    earliest = %window.earliest().format("%H:%M"),
                    latest = %window.latest().format("%H:%M"),
                    "adjusted time is outside the slot window; keeping it"
                );
                time
            }
            Some(time) => time,
            None => slot.nominal_time(),
        };

        Ok(self.record_at(local_timestamp(day, time, offset)?))
    }

    /// Where a new entry lands: a clicked slot on `day` at its nominal or
    /// adjusted time, an explicit time on `day`, or `now` when neither is given.
    pub fn place(
        &self,
        slot: Option<Slot>,
        day: NaiveDate,
        adjusted: Option<NaiveTime>,
        now: DateTime<FixedOffset>,
        offset: &FixedOffset,
    ) -> Result<ActivityRecord> {
        match (slot, adjusted) {
            (Some(slot), adjusted) => self.finalize(slot, day, adjusted, offset),
            (None, Some(time)) => Ok(self.record_at(local_timestamp(day, time, offset)?)),
            (None, None) => Ok(self.record_at(now)),
        }
    }

    /// Record stamped at an explicit instant; `now` for a quick add.
    pub fn record_at(&self, timestamp: DateTime<FixedOffset>) -> ActivityRecord {
        ActivityRecord::new(self.activity_type(), timestamp)
            .with_details(self.details())
            .with_duration(self.duration())
    }
}

pub fn local_timestamp(
    day: NaiveDate,
    time: NaiveTime,
    offset: &FixedOffset,
) -> Result<DateTime<FixedOffset>> {
    day.and_time(time)
        .and_local_timezone(*offset)
        .single()
        .with_context(|| format!("Failed to build timestamp for {day} {time}"))
}

pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, rest) => format!("{rest}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h {rest}m"),
    }
}

fn with_notes(summary: String, notes: &Option<String>) -> String {
    match notes.as_deref().map(str::trim).filter(|notes| !notes.is_empty()) {
        Some(notes) => format!("{summary} - {notes}"),
        None => summary,
    }
}
