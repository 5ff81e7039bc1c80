use crate::slots::{AdjustmentWindow, Slot};
use anyhow::{Context, Result};
use chrono::NaiveTime;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};

pub fn confirm_destructive(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation input")
}

/// Offers the slot's adjustment window, preselecting the nominal time.
pub fn select_adjusted_time(slot: Slot) -> Result<NaiveTime> {
    let window = AdjustmentWindow::for_slot(slot);
    let options = window.options();
    let labels = options
        .iter()
        .map(|time| time.format("%H:%M").to_string())
        .collect::<Vec<_>>();
    let nominal = options
        .iter()
        .position(|time| *time == window.nominal())
        .unwrap_or(0);

    let selected = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("  Time for slot {}", slot.label()))
        .default(nominal)
        .items(&labels)
        .interact()
        .context("Failed to select entry time")?;

    Ok(options.get(selected).copied().unwrap_or_else(|| window.nominal()))
}
