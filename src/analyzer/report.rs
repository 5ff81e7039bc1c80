use crate::analyzer::stats::{DailyStats, TypeStats};
use crate::analyzer::timeline::Timeline;
use crate::registry::config_for;
use crate::slots::SLOTS_PER_HOUR;
use crate::store::ActivityRecord;
use chrono::FixedOffset;

const PROGRESS_WIDTH: usize = 10;

pub fn render_stats(stats: &DailyStats) -> String {
    let header = match stats.reference {
        Some(now) => format!("# Today - {}", now.format("%Y-%m-%d %H:%M:%S")),
        None => "# Today - --:--".to_string(),
    };

    let rows = stats
        .types
        .iter()
        .map(|entry| {
            let config = config_for(entry.activity_type);
            format!(
                "| {} {} | {}/{} | {} | {} |",
                config.icon,
                config.name,
                entry.today_count,
                entry.target_frequency,
                progress_bar(entry),
                entry.elapsed_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{header}\n\n| Activity | Today | Progress | Since last |\n|----------|-------|----------|------------|\n{rows}\n\nTotal today: {}\n",
        stats.total_today()
    )
}

/// One line per hour, one cell per 10-minute slot: `.` empty, digit = count,
/// `+` for ten or more, `>` marks the current slot when it is empty.
pub fn render_timeline(timeline: &Timeline<'_>) -> String {
    let config = config_for(timeline.activity_type);
    let title = match timeline.day {
        Some(day) => format!("{} {} - {}", config.icon, config.name, day.format("%Y-%m-%d")),
        None => format!("{} {} - all days", config.icon, config.name),
    };

    let grid = timeline
        .slots
        .chunks(SLOTS_PER_HOUR)
        .enumerate()
        .map(|(hour, slots)| {
            let cells = slots
                .iter()
                .map(|slot| match slot.activities.len() {
                    0 if timeline.current_slot == Some(slot.index) => '>',
                    0 => '.',
                    count @ 1..=9 => char::from_digit(count as u32, 10).unwrap_or('+'),
                    _ => '+',
                })
                .collect::<String>();
            format!("{hour:02}:00 {cells}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{title}\n{grid}\nEntries: {} in {} slot(s)\n",
        timeline.total(),
        timeline.occupied().count()
    )
}

pub fn render_record_line(record: &ActivityRecord, offset: &FixedOffset) -> String {
    let config = config_for(record.activity_type);
    let details = record.details.as_deref().unwrap_or("-");

    format!(
        "{}  {} {:<8}  {}  {}",
        record.id,
        config.icon,
        config.name,
        record.format_timestamp(offset),
        details
    )
}

pub fn render_record_detail(record: &ActivityRecord, offset: &FixedOffset) -> String {
    let config = config_for(record.activity_type);
    let mut lines = vec![
        format!("{} {}", config.icon, config.name),
        format!("- time: {}", record.format_timestamp(offset)),
    ];

    if let Some(duration) = record.duration {
        lines.push(format!("- duration: {duration} min"));
    }
    if let Some(details) = &record.details {
        lines.push(format!("- details: {details}"));
    }
    lines.push(format!("- id: {}", record.id));

    lines.join("\n")
}

fn progress_bar(stats: &TypeStats) -> String {
    let filled = ((stats.progress_ratio.clamp(0.0, 1.0) * PROGRESS_WIDTH as f64).round() as usize)
        .min(PROGRESS_WIDTH);
    format!(
        "{}{} {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        stats.progress_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::stats::derive_stats;
    use crate::analyzer::timeline::TimelineProjector;
    use crate::registry::ActivityType;
    use chrono::TimeZone;

    fn utc8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn stats_table_shows_placeholder_without_records() {
        let now = utc8().with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let rendered = render_stats(&derive_stats(&[], Some(now)));

        assert!(rendered.contains("# Today - 2024-01-01 10:00:00"));
        assert!(rendered.contains("| 🍼 Feeding | 0/8 | ----------   0% | --:-- |"));
        assert!(rendered.contains("Total today: 0"));
    }

    #[test]
    fn stats_table_shows_elapsed_and_progress() {
        let now = utc8().with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let fed = utc8().with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        let activities = vec![ActivityRecord::new(ActivityType::Bath, fed)];

        let rendered = render_stats(&derive_stats(&activities, Some(now)));
        assert!(rendered.contains("| 🛁 Bath | 1/1 | ########## 100% | 1h 30m |"));
    }

    #[test]
    fn timeline_grid_marks_counts_and_current_slot() {
        let now = utc8().with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let activities = vec![
            ActivityRecord::new(ActivityType::Feeding, utc8().with_ymd_and_hms(2024, 1, 1, 8, 31, 0).unwrap()),
            ActivityRecord::new(ActivityType::Feeding, utc8().with_ymd_and_hms(2024, 1, 1, 8, 37, 0).unwrap()),
        ];
        let timeline =
            TimelineProjector::new(utc8()).project(&activities, ActivityType::Feeding, Some(now));

        let rendered = render_timeline(&timeline);
        assert!(rendered.contains("08:00 ...2.."));
        assert!(rendered.contains("10:00 >....."));
        assert!(rendered.contains("Entries: 2"));
    }

    #[test]
    fn record_detail_lists_optional_fields() {
        let at = utc8().with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap();
        let record = ActivityRecord::new(ActivityType::Sleep, at)
            .with_details(Some("Nap 45m".to_string()))
            .with_duration(Some(45));

        let rendered = render_record_detail(&record, &utc8());
        assert!(rendered.contains("- time: 2024-01-01 13:00:00"));
        assert!(rendered.contains("- duration: 45 min"));
        assert!(rendered.contains("- details: Nap 45m"));
    }
}
