use crate::domain::busy_time::{BusySnapshot, BusyTimeModel};
use crate::domain::models::{Difficulty, Goal, Task};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Bucket for tasks without a goal, or whose goal name matches no goal.
pub const UNALIGNED_GOAL: &str = "Unaligned";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FocusTask {
    pub name: String,
    pub duration_hours: f64,
    pub difficulty: Difficulty,
    pub notes: String,
}

impl From<&Task> for FocusTask {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            duration_hours: task.duration_hours,
            difficulty: task.difficulty,
            notes: task.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalFocus {
    pub goal: String,
    /// `None` only for the unaligned bucket.
    pub difficulty: Option<Difficulty>,
    pub notes: String,
    pub tasks: Vec<FocusTask>,
}

/// Advisory text for the assistant. Nothing here is enforced locally.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationGuidelines {
    pub bundle_tasks: &'static str,
    pub balance: &'static str,
    pub avoid_single_task_blocks: &'static str,
}

impl Default for GenerationGuidelines {
    fn default() -> Self {
        Self {
            bundle_tasks: "Group related tasks into shared focus blocks when possible.",
            balance: "Balance workload across the week and mix easy and difficult sessions.",
            avoid_single_task_blocks:
                "Avoid mapping each task to its own block unless necessary.",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchedulingContext {
    pub goals: Vec<Goal>,
    pub tasks: Vec<Task>,
    pub busy: BusySnapshot,
    pub goal_focus: Vec<GoalFocus>,
    pub guidelines: GenerationGuidelines,
}

pub fn build_schedule_context(
    tasks: &[Task],
    goals: &[Goal],
    busy: &BusyTimeModel,
) -> SchedulingContext {
    let known_goals = goals
        .iter()
        .map(|goal| goal.name.as_str())
        .collect::<HashSet<_>>();

    let mut tasks_by_goal: HashMap<&str, Vec<FocusTask>> = HashMap::new();
    let mut unaligned = Vec::new();
    for task in tasks {
        match task
            .goal
            .as_deref()
            .filter(|name| known_goals.contains(name))
        {
            Some(name) => tasks_by_goal.entry(name).or_default().push(task.into()),
            None => unaligned.push(FocusTask::from(task)),
        }
    }

    let mut emitted = HashSet::new();
    let mut goal_focus = Vec::with_capacity(goals.len() + 1);
    for goal in goals {
        if !emitted.insert(goal.name.as_str()) {
            continue;
        }
        goal_focus.push(GoalFocus {
            goal: goal.name.clone(),
            difficulty: Some(goal.difficulty),
            notes: goal.notes.clone(),
            tasks: tasks_by_goal.remove(goal.name.as_str()).unwrap_or_default(),
        });
    }
    if !unaligned.is_empty() {
        goal_focus.push(GoalFocus {
            goal: UNALIGNED_GOAL.to_string(),
            difficulty: None,
            notes: String::new(),
            tasks: unaligned,
        });
    }

    debug!(
        tasks = tasks.len(),
        goals = goals.len(),
        focus_entries = goal_focus.len(),
        "built scheduling context"
    );

    SchedulingContext {
        goals: goals.to_vec(),
        tasks: tasks.to_vec(),
        busy: busy.snapshot(),
        goal_focus,
        guidelines: GenerationGuidelines::default(),
    }
}
