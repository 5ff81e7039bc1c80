use crate::registry::ActivityType;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Minutes; display only, never used for slot placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl ActivityRecord {
    pub fn new(activity_type: ActivityType, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            id: generate_id(),
            activity_type,
            timestamp,
            details: None,
            duration: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_duration(mut self, duration: Option<u32>) -> Self {
        self.duration = duration;
        self
    }

    pub fn format_timestamp(&self, offset: &FixedOffset) -> String {
        self.timestamp
            .with_timezone(offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).expect("valid offset")
    }

    #[test]
    fn serializes_with_browser_field_names() {
        let timestamp = utc8().with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        let record = ActivityRecord {
            id: "abc".to_string(),
            activity_type: ActivityType::Feeding,
            timestamp,
            details: None,
            duration: Some(15),
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["type"], "feeding");
        assert_eq!(value["timestamp"], "2024-01-01T08:30:00+08:00");
        assert_eq!(value["duration"], 15);
        assert!(value.get("details").is_none());
    }

    #[test]
    fn parses_iso_timestamp_with_zulu_suffix() {
        let raw = r#"{"id":"lq2x9","type":"diaper","timestamp":"2024-01-01T00:30:00.000Z"}"#;
        let record: ActivityRecord = serde_json::from_str(raw).expect("parse record");

        assert_eq!(record.activity_type, ActivityType::Diaper);
        assert_eq!(record.format_timestamp(&utc8()), "2024-01-01 08:30:00");
        assert_eq!(record.details, None);
    }

    #[test]
    fn generated_ids_are_unique() {
        let timestamp = utc8().with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        let first = ActivityRecord::new(ActivityType::Play, timestamp);
        let second = ActivityRecord::new(ActivityType::Play, timestamp);

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn blank_details_are_dropped() {
        let timestamp = utc8().with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        let record = ActivityRecord::new(ActivityType::Bath, timestamp)
            .with_details(Some("   ".to_string()));

        assert_eq!(record.details, None);
    }
}
