use crate::domain::busy_time::BusyTimeModel;
use crate::domain::models::TimeBlock;

/// One message per (generated block, busy block) overlap. Advisory only:
/// the blocks themselves are left as they are.
pub fn find_conflicts(blocks: &[TimeBlock], busy: &BusyTimeModel) -> Vec<String> {
    let busy_blocks = busy.busy_blocks();
    blocks
        .iter()
        .flat_map(|block| {
            busy_blocks
                .iter()
                .filter(move |busy_block| block.overlaps(busy_block))
                .map(move |_| conflict_message(block))
        })
        .collect()
}

pub fn conflict_message(block: &TimeBlock) -> String {
    format!(
        "{} on {} {}-{} overlaps busy time.",
        block.title, block.day, block.start, block.end
    )
}
