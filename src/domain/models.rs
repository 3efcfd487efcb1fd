use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Position in the canonical Monday-first week.
    pub fn index(self) -> usize {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Exact match against the canonical names. Misspellings and other
    /// casings are not weekdays.
    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Low,
    #[default]
    Medium,
    High,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::Low, Self::Medium, Self::High]
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub name: String,
    pub duration_hours: f64,
    pub difficulty: Difficulty,
    pub notes: String,
    pub goal: Option<String>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "task.name")?;
        if !self.duration_hours.is_finite() || self.duration_hours <= 0.0 {
            return Err("task.duration_hours must be a positive number".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub name: String,
    pub difficulty: Difficulty,
    pub notes: String,
}

impl Goal {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "goal.name")
    }
}

/// Time of day with minute precision. `24:00` is representable so that a
/// slot in the last hour of the day can end at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    const END_OF_DAY: u16 = 24 * 60;

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute > 59 {
            return None;
        }
        let minutes = hour.checked_mul(60)?.checked_add(minute)?;
        (minutes <= Self::END_OF_DAY).then_some(Self(minutes))
    }

    /// Accepts `HH:MM` and `H:MM` in 24-hour form.
    pub fn parse(value: &str) -> Option<Self> {
        let (hour_str, minute_str) = value.trim().split_once(':')?;
        if hour_str.is_empty() || hour_str.len() > 2 || minute_str.len() != 2 {
            return None;
        }
        if !hour_str.bytes().chain(minute_str.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hour = hour_str.parse::<u16>().ok()?;
        let minute = minute_str.parse::<u16>().ok()?;
        Self::from_hm(hour, minute)
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    pub fn to_naive_time(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {raw}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBlock {
    pub title: String,
    pub day: Weekday,
    pub start: ClockTime,
    pub end: ClockTime,
    pub details: String,
}

impl TimeBlock {
    pub fn new(
        title: impl Into<String>,
        day: Weekday,
        start: ClockTime,
        end: ClockTime,
        details: impl Into<String>,
    ) -> Result<Self, String> {
        let block = Self {
            title: title.into(),
            day,
            start,
            end,
            details: details.into(),
        };
        block.validate()?;
        Ok(block)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.end <= self.start {
            return Err("time_block.end must be after time_block.start".to_string());
        }
        Ok(())
    }

    /// Half-open `[start, end)` intersection on the same weekday.
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        if self.day != other.day {
            return false;
        }
        self.start < other.end && other.start < self.end
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(hour: u16, minute: u16) -> ClockTime {
        ClockTime::from_hm(hour, minute).expect("valid clock time")
    }

    fn block(day: Weekday, start: ClockTime, end: ClockTime) -> TimeBlock {
        TimeBlock::new("Focus", day, start, end, "").expect("valid block")
    }

    fn arb_weekday() -> impl Strategy<Value = Weekday> {
        (0usize..7).prop_map(|index| Weekday::ALL[index])
    }

    fn arb_interval() -> impl Strategy<Value = (ClockTime, ClockTime)> {
        (0u16..1440, 1u16..=240).prop_map(|(start, length)| {
            let end = (start + length).min(1440);
            (ClockTime(start), ClockTime(end))
        })
    }

    #[test]
    fn clock_time_parses_and_normalizes() {
        assert_eq!(ClockTime::parse("09:30"), Some(at(9, 30)));
        assert_eq!(ClockTime::parse("9:30"), Some(at(9, 30)));
        assert_eq!(ClockTime::parse("24:00"), Some(at(24, 0)));
        assert_eq!(at(9, 5).to_string(), "09:05");
    }

    #[test]
    fn clock_time_rejects_malformed_values() {
        for raw in ["", "9", "25:00", "24:01", "12:60", "12:5", "ab:cd", "12:30:00", "-1:00"] {
            assert_eq!(ClockTime::parse(raw), None, "{raw} should not parse");
        }
    }

    #[test]
    fn end_of_day_has_no_naive_time() {
        assert!(at(24, 0).to_naive_time().is_none());
        assert_eq!(
            at(23, 15).to_naive_time(),
            NaiveTime::from_hms_opt(23, 15, 0)
        );
    }

    #[test]
    fn time_block_rejects_reversed_or_empty_range() {
        assert!(TimeBlock::new("x", Weekday::Monday, at(10, 0), at(9, 0), "").is_err());
        assert!(TimeBlock::new("x", Weekday::Monday, at(10, 0), at(10, 0), "").is_err());
    }

    #[test]
    fn touching_blocks_do_not_overlap() {
        let busy = block(Weekday::Monday, at(9, 0), at(10, 0));
        let next = block(Weekday::Monday, at(10, 0), at(11, 0));
        assert!(!busy.overlaps(&next));
        assert!(!next.overlaps(&busy));
    }

    #[test]
    fn partial_overlap_is_detected() {
        let busy = block(Weekday::Monday, at(9, 0), at(10, 0));
        let generated = block(Weekday::Monday, at(9, 30), at(10, 30));
        assert!(busy.overlaps(&generated));
    }

    #[test]
    fn weekday_names_are_exact() {
        assert_eq!(Weekday::from_name("Friday"), Some(Weekday::Friday));
        assert_eq!(Weekday::from_name("friday"), None);
        assert_eq!(Weekday::from_name("Funday"), None);
        assert_eq!(Weekday::Sunday.index(), 6);
    }

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse(" high "), Some(Difficulty::High));
        assert_eq!(Difficulty::parse("Extreme"), None);
    }

    #[test]
    fn task_validate_rejects_blank_name_and_non_positive_duration() {
        let mut task = Task {
            name: "Write report".to_string(),
            duration_hours: 2.0,
            difficulty: Difficulty::Medium,
            notes: String::new(),
            goal: None,
        };
        assert!(task.validate().is_ok());
        task.duration_hours = 0.0;
        assert!(task.validate().is_err());
        task.duration_hours = 1.0;
        task.name = "  ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn time_block_serializes_times_as_hhmm() {
        let value = serde_json::to_value(block(Weekday::Tuesday, at(8, 0), at(9, 30)))
            .expect("serialize block");
        assert_eq!(value["day"], "Tuesday");
        assert_eq!(value["start"], "08:00");
        assert_eq!(value["end"], "09:30");
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            day in arb_weekday(),
            (a_start, a_end) in arb_interval(),
            (b_start, b_end) in arb_interval()
        ) {
            let a = block(day, a_start, a_end);
            let b = block(day, b_start, b_end);
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }

    proptest! {
        #[test]
        fn adjacent_intervals_never_overlap(
            day in arb_weekday(),
            start in 0u16..1200,
            first_len in 1u16..=120,
            second_len in 1u16..=120
        ) {
            let boundary = start + first_len;
            let a = block(day, ClockTime(start), ClockTime(boundary));
            let b = block(day, ClockTime(boundary), ClockTime(boundary + second_len));
            prop_assert!(!a.overlaps(&b));
        }
    }

    proptest! {
        #[test]
        fn different_weekdays_never_overlap(
            first in arb_weekday(),
            offset in 1usize..7,
            (a_start, a_end) in arb_interval(),
            (b_start, b_end) in arb_interval()
        ) {
            let second = Weekday::ALL[(first.index() + offset) % 7];
            let a = block(first, a_start, a_end);
            let b = block(second, b_start, b_end);
            prop_assert!(!a.overlaps(&b));
        }
    }
}
