use crate::store::DEFAULT_STORAGE_KEY;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = ".BabyTracker";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
pub const DEFAULT_REFRESH_SECONDS: u64 = 1;
const MAX_REFRESH_SECONDS: u64 = 60;
const MIN_OFFSET_HOURS: i32 = -12;
const MAX_OFFSET_HOURS: i32 = 14;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_port: u16,
    pub utc_offset_hours: i32,
    pub refresh_seconds: u64,
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            db_path: root.join("db").join("tracker.db"),
            api_port: 7891,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            refresh_seconds: DEFAULT_REFRESH_SECONDS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.refresh_seconds = config.refresh_seconds.clamp(1, MAX_REFRESH_SECONDS);

        let clamped = config.utc_offset_hours.clamp(MIN_OFFSET_HOURS, MAX_OFFSET_HOURS);
        if clamped != config.utc_offset_hours {
            warn!(
                configured = config.utc_offset_hours,
                used = clamped,
                "utc_offset_hours out of range; clamping"
            );
            config.utc_offset_hours = clamped;
        }

        Ok(config)
    }

    /// Loads the config, writing defaults only when no file exists yet.
    /// An existing file that fails to parse is reported, never replaced.
    pub fn load_or_init() -> Result<Self> {
        Self::load_or_init_at(&Self::config_path()?)
    }

    pub fn load_or_init_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from(config_path);
        }

        let config = Self::default();
        config.ensure_bootstrap_files()?;
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    /// Offset every timestamp is shown and bucketed in.
    pub fn display_offset(&self) -> FixedOffset {
        parse_offset_hours(self.utc_offset_hours)
            .or_else(|_| parse_offset_hours(DEFAULT_UTC_OFFSET_HOURS))
            .unwrap_or_else(|_| Utc.fix())
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.display_offset())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                self.db_path = expand_home(value.trim());
            }
            "api_port" => {
                self.api_port = value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "utc_offset_hours" => {
                let hours = value
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| anyhow!("utc_offset_hours must be a whole number"))?;
                parse_offset_hours(hours)?;
                self.utc_offset_hours = hours;
            }
            "refresh_seconds" => {
                self.refresh_seconds = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow!("refresh_seconds must be a number"))?
                    .clamp(1, MAX_REFRESH_SECONDS);
            }
            "storage_key" => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    bail!("storage_key must not be empty");
                }
                self.storage_key = trimmed.to_string();
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, api_port|api.port, utc_offset_hours|display.utc_offset_hours, refresh_seconds|display.refresh_seconds, storage_key|storage.key"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "utc_offset_hours" => Some(self.utc_offset_hours.to_string()),
            "refresh_seconds" => Some(self.refresh_seconds.to_string()),
            "storage_key" => Some(self.storage_key.clone()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "api_port" | "api.port" => "api_port",
        "utc_offset_hours" | "display.utc_offset_hours" => "utc_offset_hours",
        "refresh_seconds" | "display.refresh_seconds" => "refresh_seconds",
        "storage_key" | "storage.key" => "storage_key",
        _ => key,
    }
}

fn parse_offset_hours(hours: i32) -> Result<FixedOffset> {
    if !(MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&hours) {
        bail!("utc_offset_hours must be between -12 and 14, got {hours}");
    }

    FixedOffset::east_opt(hours * 3600)
        .with_context(|| format!("Invalid UTC offset: {hours} hours"))
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .with_context(|| format!("Invalid time format: {value}. Example: 08:30 (24-hour format)"))
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_accepts_aliases_and_validates() {
        let mut config = Config::default();

        config.set_value("display.utc_offset_hours", "-5").unwrap();
        assert_eq!(config.display_offset().local_minus_utc(), -5 * 3600);

        assert!(config.set_value("utc_offset_hours", "20").is_err());
        assert_eq!(config.utc_offset_hours, -5);

        config.set_value("refresh_seconds", "600").unwrap();
        assert_eq!(config.get_value("display.refresh_seconds").as_deref(), Some("60"));

        assert!(config.set_value("storage.key", "  ").is_err());
        assert!(config.set_value("theme", "dark").is_err());
        assert_eq!(config.get_value("theme"), None);
    }

    #[test]
    fn out_of_range_offset_is_clamped_and_file_kept() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        let content = r#"{"db_path":"/data/baby.db","utc_offset_hours":20,"storage_key":"mine"}"#;
        fs::write(&path, content).unwrap();

        let config = Config::load_or_init_at(&path).expect("load config");
        assert_eq!(config.db_path, PathBuf::from("/data/baby.db"));
        assert_eq!(config.storage_key, "mine");
        assert_eq!(config.utc_offset_hours, 14);
        assert_eq!(config.display_offset().local_minus_utc(), 14 * 3600);

        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn unparseable_config_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{broken").unwrap();

        assert!(Config::load_or_init_at(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{broken");
    }

    #[test]
    fn save_to_round_trips_custom_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set_value("storage.key", "twins").unwrap();
        config.set_value("api.port", "9000").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage_key, "twins");
        assert_eq!(loaded.api_port, 9000);
    }

    #[test]
    fn default_offset_is_utc_plus_eight() {
        assert_eq!(Config::default().display_offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn parse_hhmm_rejects_garbage() {
        assert_eq!(parse_hhmm("08:30").unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(parse_hhmm("8h30").is_err());
    }
}
