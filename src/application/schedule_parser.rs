use crate::domain::models::{ClockTime, TimeBlock, Weekday};
use serde_json::{Map, Value};
use tracing::debug;

/// Turns the assistant's `{"days": {<weekday>: [...]}}` reply into a
/// week-ordered list of blocks. Unknown weekdays and malformed entries are
/// dropped; nothing here fails.
pub fn parse_schedule(raw: &Value) -> Vec<TimeBlock> {
    let Some(days) = raw.get("days").and_then(Value::as_object) else {
        debug!("schedule response has no days object");
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for (day_name, entries) in days {
        let Some(day) = Weekday::from_name(day_name) else {
            debug!(day = %day_name, "skipping unknown weekday");
            continue;
        };
        let Some(entries) = entries.as_array() else {
            debug!(day = %day_name, "skipping weekday without an entry list");
            continue;
        };
        blocks.extend(entries.iter().filter_map(|entry| {
            let block = entry.as_object().and_then(|entry| parse_entry(day, entry));
            if block.is_none() {
                debug!(day = %day_name, entry = %entry, "skipping malformed schedule entry");
            }
            block
        }));
    }

    sort_blocks(&mut blocks);
    blocks
}

/// Canonical week order, then start time. Stable, so equal keys keep the
/// assistant's order.
pub fn sort_blocks(blocks: &mut [TimeBlock]) {
    blocks.sort_by_key(|block| (block.day.index(), block.start));
}

fn parse_entry(day: Weekday, entry: &Map<String, Value>) -> Option<TimeBlock> {
    let title = entry.get("title")?.as_str()?;
    let start = ClockTime::parse(entry.get("start")?.as_str()?)?;
    let end = ClockTime::parse(entry.get("end")?.as_str()?)?;
    let details = entry
        .get("details")
        .and_then(Value::as_str)
        .unwrap_or_default();
    TimeBlock::new(title, day, start, end, details).ok()
}
