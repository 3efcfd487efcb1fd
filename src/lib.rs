pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{
    add_goal_impl, add_task_impl, generate_schedule_impl, goal_options_impl, list_goals_impl,
    list_tasks_impl, start_reminders_impl, stop_reminders_impl, toggle_busy_impl,
    GeneratedSchedule, GoalInput, PlannerSession, TaskInput,
};
pub use application::reminders::{ReminderNotice, ReminderScheduler, ReminderStart};
pub use application::scheduler::GptScheduler;
pub use application::summary::format_week;
pub use domain::models::{ClockTime, Difficulty, Goal, Task, TimeBlock, Weekday};
pub use infrastructure::assistant_client::{AssistantHttpClient, ReqwestAssistantClient};
pub use infrastructure::config::{load_scheduler_config_from_env, SchedulerConfig};
pub use infrastructure::error::InfraError;
