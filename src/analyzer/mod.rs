pub mod report;
pub mod stats;
pub mod timeline;

use crate::analyzer::stats::{DailyStats, derive_stats};
use crate::analyzer::timeline::{Timeline, TimelineProjector};
use crate::registry::ActivityType;
use crate::store::ActivityRecord;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Stats and every per-type timeline derived from one reference instant.
#[derive(Debug, Serialize)]
pub struct Overview<'a> {
    pub stats: DailyStats,
    pub timelines: Vec<Timeline<'a>>,
}

pub fn overview<'a>(
    activities: &'a [ActivityRecord],
    now: Option<DateTime<FixedOffset>>,
    projector: &TimelineProjector,
) -> Overview<'a> {
    Overview {
        stats: derive_stats(activities, now),
        timelines: ActivityType::ALL
            .into_iter()
            .map(|activity_type| projector.project(activities, activity_type, now))
            .collect(),
    }
}
