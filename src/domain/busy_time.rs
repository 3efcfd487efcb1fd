use crate::domain::models::{ClockTime, TimeBlock, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

pub const BUSY_TITLE: &str = "Busy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusySlot {
    pub day: Weekday,
    pub start_hour: u8,
    pub duration_hours: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
}

impl BusyInterval {
    pub fn to_block(&self, day: Weekday) -> TimeBlock {
        TimeBlock {
            title: self.title.clone(),
            day,
            start: self.start,
            end: self.end,
            details: String::new(),
        }
    }
}

/// Every weekday is present, Monday first, even when it has no intervals.
pub type BusySnapshot = BTreeMap<Weekday, Vec<BusyInterval>>;

/// The user's committed hours, keyed by weekday and start hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyTimeModel {
    slots: BTreeMap<Weekday, BTreeMap<u8, u8>>,
}

impl BusyTimeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the one-hour slot at `hour`. Returns whether the hour is busy
    /// afterwards.
    pub fn toggle(&mut self, day: Weekday, hour: u8) -> Result<bool, String> {
        validate_hour(hour)?;
        let day_slots = self.slots.entry(day).or_default();
        if day_slots.remove(&hour).is_some() {
            if day_slots.is_empty() {
                self.slots.remove(&day);
            }
            return Ok(false);
        }
        day_slots.insert(hour, 1);
        Ok(true)
    }

    /// Records a slot with an explicit length, replacing any slot that
    /// already starts at the same hour.
    pub fn add_slot(&mut self, slot: BusySlot) -> Result<(), String> {
        validate_hour(slot.start_hour)?;
        if slot.duration_hours == 0 {
            return Err("busy_slot.duration_hours must be > 0".to_string());
        }
        if u16::from(slot.start_hour) + u16::from(slot.duration_hours) > 24 {
            return Err("busy_slot must end by 24:00".to_string());
        }
        self.slots
            .entry(slot.day)
            .or_default()
            .insert(slot.start_hour, slot.duration_hours);
        Ok(())
    }

    pub fn is_busy(&self, day: Weekday, hour: u8) -> bool {
        self.slots
            .get(&day)
            .is_some_and(|day_slots| day_slots.contains_key(&hour))
    }

    pub fn slots(&self) -> Vec<BusySlot> {
        self.slots
            .iter()
            .flat_map(|(day, day_slots)| {
                day_slots.iter().map(|(start_hour, duration_hours)| BusySlot {
                    day: *day,
                    start_hour: *start_hour,
                    duration_hours: *duration_hours,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn snapshot(&self) -> BusySnapshot {
        Weekday::ALL
            .into_iter()
            .map(|day| (day, self.intervals_for(day)))
            .collect()
    }

    pub fn intervals_for(&self, day: Weekday) -> Vec<BusyInterval> {
        let Some(day_slots) = self.slots.get(&day) else {
            return Vec::new();
        };
        day_slots
            .iter()
            .filter_map(|(start_hour, duration_hours)| {
                let start = ClockTime::from_hm(u16::from(*start_hour), 0)?;
                let end = ClockTime::from_hm(u16::from(*start_hour) + u16::from(*duration_hours), 0)?;
                Some(BusyInterval {
                    start,
                    end,
                    title: BUSY_TITLE.to_string(),
                })
            })
            .collect()
    }

    /// Busy intervals as comparable time blocks, in week order.
    pub fn busy_blocks(&self) -> Vec<TimeBlock> {
        self.snapshot()
            .into_iter()
            .flat_map(|(day, intervals)| {
                intervals
                    .into_iter()
                    .map(move |interval| interval.to_block(day))
            })
            .collect()
    }
}

fn validate_hour(hour: u8) -> Result<(), String> {
    if hour > 23 {
        return Err(format!("busy hour must be between 0 and 23, got {hour}"));
    }
    Ok(())
}
