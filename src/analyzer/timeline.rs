use crate::registry::ActivityType;
use crate::slots::{SLOTS_PER_DAY, Slot, slot_index, slot_to_time};
use crate::store::ActivityRecord;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineSlot<'a> {
    pub index: usize,
    pub time: String,
    pub activities: Vec<&'a ActivityRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline<'a> {
    pub activity_type: ActivityType,
    pub day: Option<NaiveDate>,
    pub current_slot: Option<usize>,
    pub slots: Vec<TimelineSlot<'a>>,
}

impl<'a> Timeline<'a> {
    pub fn occupied(&self) -> impl Iterator<Item = &TimelineSlot<'a>> {
        self.slots.iter().filter(|slot| !slot.activities.is_empty())
    }

    pub fn total(&self) -> usize {
        self.slots.iter().map(|slot| slot.activities.len()).sum()
    }
}

/// Places records into the 144-slot grid by the wall-clock time they have in
/// `offset`. Records sharing a slot keep their source order.
pub fn bin_by_slot<'a, I>(records: I, offset: &FixedOffset) -> Vec<Vec<&'a ActivityRecord>>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    records
        .into_iter()
        .fold(vec![Vec::new(); SLOTS_PER_DAY], |mut bins, record| {
            let local = record.timestamp.with_timezone(offset);
            bins[slot_index(&local)].push(record);
            bins
        })
}

pub fn current_slot(now: DateTime<FixedOffset>, offset: &FixedOffset) -> usize {
    Slot::containing(&now.with_timezone(offset)).index()
}

#[derive(Debug, Clone, Copy)]
pub struct TimelineProjector {
    offset: FixedOffset,
    day: Option<NaiveDate>,
}

impl TimelineProjector {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset, day: None }
    }

    /// Restricts placement to records on `day` in the projector's offset.
    pub fn for_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// `now` must be the same instant the daily stats were derived from so the
    /// marker and the elapsed figures never drift apart.
    pub fn project<'a>(
        &self,
        activities: &'a [ActivityRecord],
        activity_type: ActivityType,
        now: Option<DateTime<FixedOffset>>,
    ) -> Timeline<'a> {
        let selected = activities.iter().filter(|record| {
            record.activity_type == activity_type
                && self.day.is_none_or(|day| {
                    record.timestamp.with_timezone(&self.offset).date_naive() == day
                })
        });

        let slots = bin_by_slot(selected, &self.offset)
            .into_iter()
            .enumerate()
            .map(|(index, activities)| TimelineSlot {
                index,
                time: slot_to_time(index),
                activities,
            })
            .collect();

        let marker = now
            .filter(|now| {
                self.day
                    .is_none_or(|day| now.with_timezone(&self.offset).date_naive() == day)
            })
            .map(|now| current_slot(now, &self.offset));

        Timeline {
            activity_type,
            day: self.day,
            current_slot: marker,
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        utc8().with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn same_window_records_share_slot_in_insertion_order() {
        let later = ActivityRecord::new(ActivityType::Feeding, at(1, 8, 37));
        let earlier = ActivityRecord::new(ActivityType::Feeding, at(1, 8, 31));
        let activities = vec![later.clone(), earlier.clone()];

        let timeline =
            TimelineProjector::new(utc8()).project(&activities, ActivityType::Feeding, None);

        let slot = &timeline.slots[51];
        assert_eq!(slot.time, "08:30");
        assert_eq!(slot.activities, vec![&later, &earlier]);
        assert_eq!(timeline.total(), 2);
        assert_eq!(timeline.occupied().count(), 1);
    }

    #[test]
    fn projection_only_includes_requested_type() {
        let activities = vec![
            ActivityRecord::new(ActivityType::Feeding, at(1, 8, 30)),
            ActivityRecord::new(ActivityType::Diaper, at(1, 8, 30)),
        ];

        let timeline =
            TimelineProjector::new(utc8()).project(&activities, ActivityType::Diaper, None);

        assert_eq!(timeline.total(), 1);
        assert_eq!(timeline.slots.len(), SLOTS_PER_DAY);
        assert_eq!(timeline.slots[51].activities[0].activity_type, ActivityType::Diaper);
    }

    #[test]
    fn placement_uses_projector_offset() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let record = ActivityRecord::new(
            ActivityType::Sleep,
            utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap(),
        );
        let activities = vec![record];

        let timeline =
            TimelineProjector::new(utc8()).project(&activities, ActivityType::Sleep, None);

        assert_eq!(timeline.slots[51].activities.len(), 1);
    }

    #[test]
    fn unrestricted_projection_overlays_every_day() {
        let activities = vec![
            ActivityRecord::new(ActivityType::Play, at(1, 15, 0)),
            ActivityRecord::new(ActivityType::Play, at(2, 15, 5)),
        ];
        let projector = TimelineProjector::new(utc8());

        assert_eq!(
            projector.project(&activities, ActivityType::Play, None).slots[90]
                .activities
                .len(),
            2
        );

        let day_two = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let restricted = projector
            .for_day(day_two)
            .project(&activities, ActivityType::Play, None);
        assert_eq!(restricted.slots[90].activities.len(), 1);
        assert_eq!(restricted.day, Some(day_two));
    }

    #[test]
    fn current_marker_follows_reference_time() {
        let projector = TimelineProjector::new(utc8());

        let timeline = projector.project(&[], ActivityType::Bath, Some(at(1, 10, 0)));
        assert_eq!(timeline.current_slot, Some(60));
        assert_eq!(projector.project(&[], ActivityType::Bath, None).current_slot, None);

        let other_day = projector
            .for_day(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
            .project(&[], ActivityType::Bath, Some(at(1, 10, 0)));
        assert_eq!(other_day.current_slot, None);
    }
}
