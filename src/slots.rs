use anyhow::{Result, bail};
use chrono::{NaiveTime, Timelike};

pub const SLOT_MINUTES: u32 = 10;
pub const SLOTS_PER_HOUR: usize = 6;
pub const SLOTS_PER_DAY: usize = 144;

const ADJUST_RANGE_MINUTES: u32 = 30;
const LAST_SLOT_MINUTE: u32 = 23 * 60 + 50;

/// Maps the wall-clock hour and minute of `time` onto one of the 144 daily slots.
///
/// No timezone conversion happens here; callers pass a value already expressed
/// in the display offset.
pub fn slot_index<T: Timelike>(time: &T) -> usize {
    time.hour() as usize * SLOTS_PER_HOUR + (time.minute() / SLOT_MINUTES) as usize
}

/// Renders the nominal start of a slot as `HH:MM`.
///
/// Panics when `index` is outside `0..144`; an out-of-range index is a caller bug.
pub fn slot_to_time(index: usize) -> String {
    Slot::new(index).label()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    index: usize,
}

impl Slot {
    pub fn new(index: usize) -> Self {
        assert!(
            index < SLOTS_PER_DAY,
            "slot index {index} out of range 0..{SLOTS_PER_DAY}"
        );
        Self { index }
    }

    pub fn try_new(index: usize) -> Option<Self> {
        (index < SLOTS_PER_DAY).then_some(Self { index })
    }

    /// Validates an index supplied by a user.
    pub fn parse_index(index: usize) -> Result<Self> {
        match Self::try_new(index) {
            Some(slot) => Ok(slot),
            None => bail!("Slot must be between 0 and {}, got {index}", SLOTS_PER_DAY - 1),
        }
    }

    pub fn containing<T: Timelike>(time: &T) -> Self {
        Self::new(slot_index(time))
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn hour(self) -> u32 {
        (self.index / SLOTS_PER_HOUR) as u32
    }

    pub fn minute(self) -> u32 {
        (self.index % SLOTS_PER_HOUR) as u32 * SLOT_MINUTES
    }

    pub fn nominal_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn label(self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Range of times a data-entry form offers around a clicked slot: thirty
/// minutes either side, in 10-minute steps, clamped to the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentWindow {
    nominal: u32,
    min: u32,
    max: u32,
}

impl AdjustmentWindow {
    pub fn around(time: NaiveTime) -> Self {
        let minute_of_day = time.hour() * 60 + time.minute();
        let nominal = minute_of_day / SLOT_MINUTES * SLOT_MINUTES;

        Self {
            nominal,
            min: nominal.saturating_sub(ADJUST_RANGE_MINUTES),
            max: (nominal + ADJUST_RANGE_MINUTES).min(LAST_SLOT_MINUTE),
        }
    }

    pub fn for_slot(slot: Slot) -> Self {
        Self::around(slot.nominal_time())
    }

    pub fn nominal(&self) -> NaiveTime {
        minute_to_time(self.nominal)
    }

    pub fn earliest(&self) -> NaiveTime {
        minute_to_time(self.min)
    }

    pub fn latest(&self) -> NaiveTime {
        minute_to_time(self.max)
    }

    pub fn options(&self) -> Vec<NaiveTime> {
        (self.min..=self.max)
            .step_by(SLOT_MINUTES as usize)
            .map(minute_to_time)
            .collect()
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute_of_day = time.hour() * 60 + time.minute();
        (self.min..=self.max).contains(&minute_of_day)
    }
}

fn minute_to_time(minute_of_day: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, 0).unwrap_or(NaiveTime::MIN)
}
