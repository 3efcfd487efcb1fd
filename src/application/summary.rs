use crate::domain::busy_time::BusyTimeModel;
use crate::domain::models::{TimeBlock, Weekday};

/// Plain-text week overview: existing commitments and planned blocks per
/// weekday, Monday first.
pub fn format_week(blocks: &[TimeBlock], busy: &BusyTimeModel) -> String {
    let mut lines = Vec::new();
    for day in Weekday::ALL {
        lines.push(day.to_string());
        lines.push("-".repeat(day.as_str().len()));
        lines.extend(day_lines(day, blocks, busy));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn day_lines(day: Weekday, blocks: &[TimeBlock], busy: &BusyTimeModel) -> Vec<String> {
    let mut lines = Vec::new();

    let commitments = busy.intervals_for(day);
    if commitments.is_empty() {
        lines.push("Existing commitments: None".to_string());
    } else {
        lines.push("Existing commitments:".to_string());
        lines.extend(
            commitments
                .iter()
                .map(|slot| format!("  {}-{}: {}", slot.start, slot.end, slot.title)),
        );
    }

    let planned = blocks
        .iter()
        .filter(|block| block.day == day)
        .collect::<Vec<_>>();
    if planned.is_empty() {
        lines.push("Planned tasks: None".to_string());
    } else {
        lines.push("Planned tasks:".to_string());
        lines.extend(planned.iter().map(|block| {
            format!(
                "  {}-{}: {} ({})",
                block.start, block.end, block.title, block.details
            )
        }));
    }
    lines
}
