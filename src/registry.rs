use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Feeding,
    Diaper,
    Sleep,
    Play,
    Bath,
    Medicine,
    Custom,
}

impl ActivityType {
    /// Rendering order shared by every consumer that iterates the registry.
    pub const ALL: [ActivityType; 7] = [
        ActivityType::Feeding,
        ActivityType::Diaper,
        ActivityType::Sleep,
        ActivityType::Play,
        ActivityType::Bath,
        ActivityType::Medicine,
        ActivityType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Feeding => "feeding",
            ActivityType::Diaper => "diaper",
            ActivityType::Sleep => "sleep",
            ActivityType::Play => "play",
            ActivityType::Bath => "bath",
            ActivityType::Medicine => "medicine",
            ActivityType::Custom => "custom",
        }
    }

    /// Unknown identifiers (legacy or hand-edited data) fall back to `Custom`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(ActivityType::Custom)
    }

    pub fn config(self) -> &'static ActivityConfig {
        config_for(self)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase();
        match ActivityType::ALL
            .into_iter()
            .find(|activity_type| activity_type.as_str() == normalized)
        {
            Some(activity_type) => Ok(activity_type),
            None => bail!(
                "Unknown activity type: {value}. Supported types: feeding, diaper, sleep, play, bath, medicine, custom"
            ),
        }
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ActivityType::parse_lenient(&raw))
    }
}

/// Field deserializer for user input, where an unknown type is an error
/// rather than `custom`.
pub fn deserialize_strict<'de, D>(deserializer: D) -> std::result::Result<ActivityType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityConfig {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub target_frequency: u32,
}

pub const DEFAULT_TARGET_FREQUENCY: u32 = 5;

const FEEDING: ActivityConfig = ActivityConfig {
    name: "Feeding",
    icon: "🍼",
    color: "#3b82f6",
    description: "Bottle, breast and solid food feeds",
    target_frequency: 8,
};

const DIAPER: ActivityConfig = ActivityConfig {
    name: "Diaper",
    icon: "👶",
    color: "#10b981",
    description: "Diaper changes",
    target_frequency: 8,
};

const SLEEP: ActivityConfig = ActivityConfig {
    name: "Sleep",
    icon: "😴",
    color: "#8b5cf6",
    description: "Naps and night sleep",
    target_frequency: 4,
};

const PLAY: ActivityConfig = ActivityConfig {
    name: "Play",
    icon: "🧸",
    color: "#f59e0b",
    description: "Play and tummy time",
    target_frequency: 3,
};

const BATH: ActivityConfig = ActivityConfig {
    name: "Bath",
    icon: "🛁",
    color: "#06b6d4",
    description: "Baths",
    target_frequency: 1,
};

const MEDICINE: ActivityConfig = ActivityConfig {
    name: "Medicine",
    icon: "💊",
    color: "#ef4444",
    description: "Medicine and supplements",
    target_frequency: 2,
};

const CUSTOM: ActivityConfig = ActivityConfig {
    name: "Custom",
    icon: "📝",
    color: "#6b7280",
    description: "Free-form entries",
    target_frequency: DEFAULT_TARGET_FREQUENCY,
};

pub fn config_for(activity_type: ActivityType) -> &'static ActivityConfig {
    match activity_type {
        ActivityType::Feeding => &FEEDING,
        ActivityType::Diaper => &DIAPER,
        ActivityType::Sleep => &SLEEP,
        ActivityType::Play => &PLAY,
        ActivityType::Bath => &BATH,
        ActivityType::Medicine => &MEDICINE,
        ActivityType::Custom => &CUSTOM,
    }
}

pub fn all_configs() -> Vec<(ActivityType, &'static ActivityConfig)> {
    ActivityType::ALL
        .into_iter()
        .map(|activity_type| (activity_type, config_for(activity_type)))
        .collect()
}
