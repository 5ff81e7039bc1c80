use crate::registry::{ActivityType, config_for};
use crate::store::ActivityRecord;
use chrono::{DateTime, FixedOffset, NaiveTime};
use serde::Serialize;
use std::fmt;

pub const ELAPSED_PLACEHOLDER: &str = "--:--";

/// Whole hours plus remainder minutes between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Elapsed {
    pub hours: i64,
    pub minutes: i64,
}

impl Elapsed {
    /// Records stamped after `to` report zero rather than a negative span.
    pub fn between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> Self {
        let total_minutes = (to - from).num_minutes().max(0);
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}h {}m", self.hours, self.minutes)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeStats {
    pub activity_type: ActivityType,
    pub today_count: usize,
    pub target_frequency: u32,
    pub last_occurrence: Option<DateTime<FixedOffset>>,
    pub elapsed_since_last: Option<Elapsed>,
    pub progress_ratio: f64,
}

impl TypeStats {
    fn empty(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            today_count: 0,
            target_frequency: config_for(activity_type).target_frequency,
            last_occurrence: None,
            elapsed_since_last: None,
            progress_ratio: 0.0,
        }
    }

    pub fn elapsed_label(&self) -> String {
        self.elapsed_since_last
            .map(|elapsed| elapsed.to_string())
            .unwrap_or_else(|| ELAPSED_PLACEHOLDER.to_string())
    }

    pub fn progress_percent(&self) -> u32 {
        (self.progress_ratio * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub reference: Option<DateTime<FixedOffset>>,
    pub types: Vec<TypeStats>,
}

impl DailyStats {
    pub fn get(&self, activity_type: ActivityType) -> Option<&TypeStats> {
        self.types
            .iter()
            .find(|stats| stats.activity_type == activity_type)
    }

    pub fn total_today(&self) -> usize {
        self.types.iter().map(|stats| stats.today_count).sum()
    }
}

pub fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*now.offset())
        .earliest()
        .unwrap_or(now)
}

/// Per-type daily counts and time-since-last for the given reference instant.
///
/// Pure: the same `(activities, now)` always yields the same result. Without a
/// reference instant every type reports the empty state.
pub fn derive_stats(activities: &[ActivityRecord], now: Option<DateTime<FixedOffset>>) -> DailyStats {
    let Some(now) = now else {
        return DailyStats {
            reference: None,
            types: ActivityType::ALL.into_iter().map(TypeStats::empty).collect(),
        };
    };

    let day_start = start_of_day(now);

    let types = ActivityType::ALL
        .into_iter()
        .map(|activity_type| {
            let of_type = activities
                .iter()
                .filter(|record| record.activity_type == activity_type);

            let today_count = of_type
                .clone()
                .filter(|record| record.timestamp >= day_start && record.timestamp <= now)
                .count();
            let last_occurrence = of_type.map(|record| record.timestamp).max();

            let target_frequency = config_for(activity_type).target_frequency;
            let progress_ratio = (today_count as f64 / f64::from(target_frequency)).min(1.0);

            TypeStats {
                activity_type,
                today_count,
                target_frequency,
                last_occurrence,
                elapsed_since_last: last_occurrence.map(|last| Elapsed::between(last, now)),
                progress_ratio,
            }
        })
        .collect();

    DailyStats {
        reference: Some(now),
        types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn record(activity_type: ActivityType, timestamp: DateTime<FixedOffset>) -> ActivityRecord {
        ActivityRecord::new(activity_type, timestamp)
    }

    fn assert_empty(stats: &TypeStats) {
        assert_eq!(stats.today_count, 0);
        assert_eq!(stats.last_occurrence, None);
        assert_eq!(stats.elapsed_since_last, None);
        assert_eq!(stats.progress_ratio, 0.0);
        assert_eq!(stats.elapsed_label(), ELAPSED_PLACEHOLDER);
    }

    #[test]
    fn empty_store_reports_empty_state_for_every_type() {
        let stats = derive_stats(&[], Some(at(1, 10, 0)));

        assert_eq!(stats.types.len(), ActivityType::ALL.len());
        stats.types.iter().for_each(assert_empty);
    }

    #[test]
    fn missing_reference_time_never_reports_zero_elapsed() {
        let activities = vec![record(ActivityType::Feeding, at(1, 8, 30))];
        let stats = derive_stats(&activities, None);

        assert_eq!(stats.reference, None);
        stats.types.iter().for_each(assert_empty);
    }

    #[test]
    fn single_feeding_reports_count_and_elapsed() {
        let activities = vec![record(ActivityType::Feeding, at(1, 8, 30))];
        let stats = derive_stats(&activities, Some(at(1, 10, 0)));
        let feeding = stats.get(ActivityType::Feeding).unwrap();

        assert_eq!(feeding.today_count, 1);
        assert_eq!(feeding.last_occurrence, Some(at(1, 8, 30)));
        assert_eq!(
            feeding.elapsed_since_last,
            Some(Elapsed {
                hours: 1,
                minutes: 30
            })
        );
        assert_eq!(feeding.elapsed_label(), "1h 30m");
        assert_empty(stats.get(ActivityType::Diaper).unwrap());
    }

    #[test]
    fn records_before_today_do_not_count_but_set_last_occurrence() {
        let activities = vec![record(ActivityType::Sleep, at(1, 22, 15))];
        let stats = derive_stats(&activities, Some(at(2, 1, 5)));
        let sleep = stats.get(ActivityType::Sleep).unwrap();

        assert_eq!(sleep.today_count, 0);
        assert_eq!(sleep.last_occurrence, Some(at(1, 22, 15)));
        assert_eq!(sleep.elapsed_label(), "2h 50m");
    }

    #[test]
    fn record_later_today_is_not_counted_and_elapsed_clamps_to_zero() {
        let activities = vec![record(ActivityType::Play, at(1, 18, 0))];
        let stats = derive_stats(&activities, Some(at(1, 10, 0)));
        let play = stats.get(ActivityType::Play).unwrap();

        assert_eq!(play.today_count, 0);
        assert_eq!(play.last_occurrence, Some(at(1, 18, 0)));
        assert_eq!(play.elapsed_since_last, Some(Elapsed { hours: 0, minutes: 0 }));
        assert_eq!(play.elapsed_label(), "0m");

        let later = derive_stats(&activities, Some(at(1, 18, 45)));
        let play = later.get(ActivityType::Play).unwrap();
        assert_eq!(play.today_count, 1);
        assert_eq!(play.elapsed_label(), "45m");
    }

    #[test]
    fn day_boundary_uses_reference_offset() {
        let utc = FixedOffset::east_opt(0).unwrap();
        // 2024-01-01T17:00Z is 2024-01-02T01:00+08:00.
        let activities = vec![record(
            ActivityType::Diaper,
            utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap(),
        )];
        let stats = derive_stats(&activities, Some(at(2, 9, 0)));

        assert_eq!(stats.get(ActivityType::Diaper).unwrap().today_count, 1);
    }

    #[test]
    fn last_occurrence_falls_back_after_deletion() {
        let older = record(ActivityType::Medicine, at(1, 6, 0));
        let newer = record(ActivityType::Medicine, at(1, 9, 0));
        let now = Some(at(1, 10, 0));

        let both = vec![newer.clone(), older.clone()];
        assert_eq!(
            derive_stats(&both, now).get(ActivityType::Medicine).unwrap().last_occurrence,
            Some(at(1, 9, 0))
        );

        let remaining = vec![older];
        assert_eq!(
            derive_stats(&remaining, now).get(ActivityType::Medicine).unwrap().last_occurrence,
            Some(at(1, 6, 0))
        );
    }

    #[test]
    fn deleting_only_record_restores_empty_state() {
        let feeding = record(ActivityType::Feeding, at(1, 8, 30));
        let diaper = record(ActivityType::Diaper, at(1, 9, 0));
        let now = Some(at(1, 10, 0));

        let before = derive_stats(&[feeding, diaper.clone()], now);
        let after = derive_stats(&[diaper], now);

        assert_empty(after.get(ActivityType::Feeding).unwrap());
        assert_eq!(after.get(ActivityType::Diaper).unwrap(), before.get(ActivityType::Diaper).unwrap());
    }

    #[test]
    fn progress_ratio_is_capped() {
        let activities = (0..5)
            .map(|index| record(ActivityType::Bath, at(1, 8, index * 10)))
            .collect::<Vec<_>>();
        let stats = derive_stats(&activities, Some(at(1, 10, 0)));
        let bath = stats.get(ActivityType::Bath).unwrap();

        assert_eq!(bath.today_count, 5);
        assert_eq!(bath.progress_ratio, 1.0);
        assert_eq!(bath.progress_percent(), 100);
        assert_eq!(stats.total_today(), 5);
    }

    #[test]
    fn derivation_is_deterministic_for_same_inputs() {
        let activities = vec![
            record(ActivityType::Play, at(1, 7, 45)),
            record(ActivityType::Feeding, at(1, 9, 5)),
        ];
        let now = Some(at(1, 9, 59));

        assert_eq!(derive_stats(&activities, now), derive_stats(&activities, now));
    }

    #[test]
    fn elapsed_formats_minutes_only_under_an_hour() {
        let elapsed = Elapsed::between(at(1, 9, 15), at(1, 9, 59));
        assert_eq!(elapsed.to_string(), "44m");
        assert_eq!(
            Elapsed::between(at(1, 11, 0), at(1, 10, 0)),
            Elapsed { hours: 0, minutes: 0 }
        );
    }
}
