use crate::application::conflicts::find_conflicts;
use crate::application::context_builder::{build_schedule_context, UNALIGNED_GOAL};
use crate::application::reminders::{ReminderNotice, ReminderScheduler, ReminderStart};
use crate::application::schedule_parser::parse_schedule;
use crate::application::scheduler::GptScheduler;
use crate::domain::busy_time::BusyTimeModel;
use crate::domain::models::{Difficulty, Goal, Task, TimeBlock, Weekday};
use crate::infrastructure::assistant_client::AssistantHttpClient;
use crate::infrastructure::error::InfraError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

const NO_GOAL_OPTION: &str = "None";

/// Everything the user entered plus the last generated schedule. Owned and
/// mutated by the foreground only; the reminder loop gets a snapshot.
pub struct PlannerSession {
    tasks: Vec<Task>,
    goals: Vec<Goal>,
    busy: BusyTimeModel,
    generated: Arc<[TimeBlock]>,
    reminders: ReminderScheduler,
    reminder_sender: UnboundedSender<ReminderNotice>,
    reminder_receiver: UnboundedReceiver<ReminderNotice>,
}

impl Default for PlannerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerSession {
    pub fn new() -> Self {
        let (reminder_sender, reminder_receiver) = unbounded_channel();
        Self {
            tasks: Vec::new(),
            goals: Vec::new(),
            busy: BusyTimeModel::new(),
            generated: Arc::from(Vec::new()),
            reminders: ReminderScheduler::new(),
            reminder_sender,
            reminder_receiver,
        }
    }

    pub fn with_reminder_scheduler(mut self, reminders: ReminderScheduler) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn busy(&self) -> &BusyTimeModel {
        &self.busy
    }

    pub fn generated_blocks(&self) -> &[TimeBlock] {
        &self.generated
    }

    pub fn reminders_running(&self) -> bool {
        self.reminders.is_running()
    }

    /// Waits for the next reminder delivered by the background loop.
    pub async fn next_reminder(&mut self) -> Option<ReminderNotice> {
        self.reminder_receiver.recv().await
    }

    pub fn try_next_reminder(&mut self) -> Option<ReminderNotice> {
        self.reminder_receiver.try_recv().ok()
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        info!(command, "{message}");
    }

    pub fn log_error(&self, command: &str, message: &str) {
        error!(command, "{message}");
    }
}

/// Raw task form fields, as typed.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub name: String,
    pub duration_hours: String,
    pub difficulty: String,
    pub goal: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct GoalInput {
    pub name: String,
    pub difficulty: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedSchedule {
    pub blocks: Vec<TimeBlock>,
    pub conflicts: Vec<String>,
}

pub fn add_task_impl(session: &mut PlannerSession, input: TaskInput) -> Result<Task, InfraError> {
    let name = input.name.trim();
    let duration = input.duration_hours.trim();
    if name.is_empty() || duration.is_empty() {
        return Err(InfraError::Validation(
            "Task name and duration are required.".to_string(),
        ));
    }
    let duration_hours = duration
        .parse::<f64>()
        .map_err(|_| InfraError::Validation("Duration must be a number.".to_string()))?;
    let difficulty = parse_difficulty(&input.difficulty)?;
    let goal = input.goal.trim();
    let goal = (!goal.is_empty() && goal != NO_GOAL_OPTION).then(|| goal.to_string());

    let task = Task {
        name: name.to_string(),
        duration_hours,
        difficulty,
        notes: input.notes.trim().to_string(),
        goal,
    };
    task.validate().map_err(InfraError::Validation)?;

    session.tasks.push(task.clone());
    session.log_info(
        "add_task",
        &format!("added task name={} duration_hours={}", task.name, task.duration_hours),
    );
    Ok(task)
}

pub fn add_goal_impl(session: &mut PlannerSession, input: GoalInput) -> Result<Goal, InfraError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(InfraError::Validation("Goal name is required.".to_string()));
    }
    if name == UNALIGNED_GOAL {
        return Err(InfraError::Validation(format!(
            "Goal name {UNALIGNED_GOAL} is reserved."
        )));
    }
    if session.goals.iter().any(|goal| goal.name == name) {
        return Err(InfraError::Validation(format!("Goal {name} already exists.")));
    }

    let goal = Goal {
        name: name.to_string(),
        difficulty: parse_difficulty(&input.difficulty)?,
        notes: input.notes.trim().to_string(),
    };
    goal.validate().map_err(InfraError::Validation)?;

    session.goals.push(goal.clone());
    session.log_info("add_goal", &format!("added goal name={}", goal.name));
    Ok(goal)
}

pub fn list_tasks_impl(session: &PlannerSession) -> Vec<Task> {
    session.tasks.clone()
}

pub fn list_goals_impl(session: &PlannerSession) -> Vec<Goal> {
    session.goals.clone()
}

/// Choices for a task's goal picker: the no-goal option, then goal names.
pub fn goal_options_impl(session: &PlannerSession) -> Vec<String> {
    std::iter::once(NO_GOAL_OPTION.to_string())
        .chain(session.goals.iter().map(|goal| goal.name.clone()))
        .collect()
}

pub fn toggle_busy_impl(
    session: &mut PlannerSession,
    day: Weekday,
    hour: u8,
) -> Result<bool, InfraError> {
    let busy = session
        .busy
        .toggle(day, hour)
        .map_err(InfraError::Validation)?;
    session.log_info(
        "toggle_busy",
        &format!("day={day} hour={hour:02} busy={busy}"),
    );
    Ok(busy)
}

/// Builds the request, asks the assistant, and replaces the stored schedule
/// on success. Any error leaves the previous schedule in place.
pub async fn generate_schedule_impl<C>(
    session: &mut PlannerSession,
    scheduler: &GptScheduler<C>,
) -> Result<GeneratedSchedule, InfraError>
where
    C: AssistantHttpClient,
{
    if session.tasks.is_empty() {
        return Err(InfraError::InvalidState(
            "Add at least one task before generating a schedule.".to_string(),
        ));
    }
    if !scheduler.is_available() {
        return Err(InfraError::Configuration(
            "An OpenAI API key is required. Set OPENAI_API_KEY in your environment to enable scheduling."
                .to_string(),
        ));
    }

    let context = build_schedule_context(&session.tasks, &session.goals, &session.busy);
    let raw = scheduler.generate(&context).await?;
    let blocks = parse_schedule(&raw);
    let conflicts = find_conflicts(&blocks, &session.busy);

    session.generated = Arc::from(blocks.clone());
    session.log_info(
        "generate_schedule",
        &format!("generated blocks={} conflicts={}", blocks.len(), conflicts.len()),
    );
    Ok(GeneratedSchedule { blocks, conflicts })
}

pub fn start_reminders_impl(session: &mut PlannerSession) -> Result<ReminderStart, InfraError> {
    if session.generated.is_empty() {
        return Err(InfraError::InvalidState(
            "Generate a schedule first.".to_string(),
        ));
    }

    let outcome = session
        .reminders
        .start(Arc::clone(&session.generated), session.reminder_sender.clone())?;
    match outcome {
        ReminderStart::Started { scheduled } => session.log_info(
            "start_reminders",
            &format!("started reminders scheduled={scheduled}"),
        ),
        ReminderStart::AlreadyActive => {
            session.log_info("start_reminders", "reminders are already active")
        }
    }
    Ok(outcome)
}

pub fn stop_reminders_impl(session: &mut PlannerSession) -> bool {
    let was_running = session.reminders.stop();
    if was_running {
        session.log_info("stop_reminders", "stop requested; loop exits at next tick");
    }
    was_running
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, InfraError> {
    if raw.trim().is_empty() {
        return Ok(Difficulty::default());
    }
    Difficulty::parse(raw).ok_or_else(|| {
        InfraError::Validation(format!(
            "Difficulty must be Low, Medium or High, got {}",
            raw.trim()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reminders::NowProvider;
    use crate::infrastructure::assistant_client::AssistantRequest;
    use crate::infrastructure::config::{SchedulerConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WEEK_REPLY: &str = r#"{
        "days": {
            "Wednesday": [{ "title": "Launch review", "start": "09:00", "end": "10:00" }],
            "Monday": [
                { "title": "Landing page", "start": "09:30", "end": "10:30", "details": "Launch" },
                { "title": "Inbox zero", "start": "08:00", "end": "09:00" }
            ],
            "Someday": [{ "title": "Dream", "start": "01:00", "end": "02:00" }]
        }
    }"#;

    #[derive(Debug, Default)]
    struct FakeAssistantClient {
        reply: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl FakeAssistantClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Mutex::new(Some(reply.to_string())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AssistantHttpClient for FakeAssistantClient {
        async fn create_response(&self, _request: AssistantRequest) -> Result<String, InfraError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .lock()
                .expect("reply mutex poisoned")
                .clone()
                .ok_or_else(|| InfraError::Generation("service unavailable".to_string()))
        }
    }

    fn available(client: &Arc<FakeAssistantClient>) -> GptScheduler<FakeAssistantClient> {
        let config = SchedulerConfig::new("sk-test", DEFAULT_MODEL, DEFAULT_BASE_URL).expect("config");
        GptScheduler::new(Some(config), Arc::clone(client))
    }

    fn task_input(name: &str, duration: &str, goal: &str) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            duration_hours: duration.to_string(),
            difficulty: "Medium".to_string(),
            goal: goal.to_string(),
            notes: String::new(),
        }
    }

    fn seeded_session() -> PlannerSession {
        let mut session = PlannerSession::new();
        add_goal_impl(
            &mut session,
            GoalInput {
                name: "Launch".to_string(),
                difficulty: "High".to_string(),
                notes: String::new(),
            },
        )
        .expect("add goal");
        add_task_impl(&mut session, task_input("Landing page", "2", "Launch")).expect("add task");
        toggle_busy_impl(&mut session, Weekday::Monday, 9).expect("toggle busy");
        session
    }

    #[test]
    fn add_task_requires_name_and_duration() {
        let mut session = PlannerSession::new();
        let result = add_task_impl(&mut session, task_input("   ", "2", ""));
        assert!(matches!(result, Err(InfraError::Validation(_))));
        let result = add_task_impl(&mut session, task_input("Write", "", ""));
        assert!(matches!(result, Err(InfraError::Validation(_))));
        assert!(session.tasks().is_empty());
    }

    #[test]
    fn add_task_rejects_non_numeric_and_non_positive_duration() {
        let mut session = PlannerSession::new();
        match add_task_impl(&mut session, task_input("Write", "two", "")) {
            Err(InfraError::Validation(message)) => assert_eq!(message, "Duration must be a number."),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(add_task_impl(&mut session, task_input("Write", "-1", "")).is_err());
        assert!(add_task_impl(&mut session, task_input("Write", "NaN", "")).is_err());
        assert!(session.tasks().is_empty());
    }

    #[test]
    fn add_task_treats_none_goal_as_unset() {
        let mut session = PlannerSession::new();
        let task = add_task_impl(&mut session, task_input(" Gym ", "1.5", "None")).expect("add task");
        assert_eq!(task.name, "Gym");
        assert_eq!(task.goal, None);
        assert_eq!(task.duration_hours, 1.5);
    }

    #[test]
    fn add_task_rejects_unknown_difficulty() {
        let mut session = PlannerSession::new();
        let mut input = task_input("Gym", "1", "");
        input.difficulty = "Brutal".to_string();
        assert!(matches!(
            add_task_impl(&mut session, input),
            Err(InfraError::Validation(_))
        ));
    }

    #[test]
    fn add_goal_rejects_empty_duplicate_and_reserved_names() {
        let mut session = seeded_session();
        for name in ["", "Launch", "Unaligned"] {
            let result = add_goal_impl(
                &mut session,
                GoalInput {
                    name: name.to_string(),
                    ..GoalInput::default()
                },
            );
            assert!(matches!(result, Err(InfraError::Validation(_))), "{name}");
        }
        assert_eq!(list_goals_impl(&session).len(), 1);
        assert_eq!(list_tasks_impl(&session)[0].goal.as_deref(), Some("Launch"));
        assert_eq!(goal_options_impl(&session), vec!["None", "Launch"]);
    }

    #[test]
    fn toggle_busy_validates_hour() {
        let mut session = PlannerSession::new();
        assert!(toggle_busy_impl(&mut session, Weekday::Friday, 17).expect("toggle on"));
        assert!(!toggle_busy_impl(&mut session, Weekday::Friday, 17).expect("toggle off"));
        assert!(matches!(
            toggle_busy_impl(&mut session, Weekday::Friday, 30),
            Err(InfraError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn generate_requires_tasks() {
        let client = Arc::new(FakeAssistantClient::replying(WEEK_REPLY));
        let mut session = PlannerSession::new();
        let result = generate_schedule_impl(&mut session, &available(&client)).await;
        assert!(matches!(result, Err(InfraError::InvalidState(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generate_requires_configured_scheduler() {
        let client = Arc::new(FakeAssistantClient::replying(WEEK_REPLY));
        let scheduler = GptScheduler::new(None, Arc::clone(&client));
        let mut session = seeded_session();
        let result = generate_schedule_impl(&mut session, &scheduler).await;
        assert!(matches!(result, Err(InfraError::Configuration(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generate_parses_sorts_and_flags_conflicts() {
        let client = Arc::new(FakeAssistantClient::replying(WEEK_REPLY));
        let mut session = seeded_session();

        let schedule = generate_schedule_impl(&mut session, &available(&client))
            .await
            .expect("generate schedule");

        let titles = schedule
            .blocks
            .iter()
            .map(|block| block.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Inbox zero", "Landing page", "Launch review"]);
        assert_eq!(
            schedule.conflicts,
            vec!["Landing page on Monday 09:30-10:30 overlaps busy time.".to_string()]
        );
        assert_eq!(session.generated_blocks(), schedule.blocks.as_slice());
    }

    #[tokio::test]
    async fn failed_generation_keeps_previous_schedule() {
        let client = Arc::new(FakeAssistantClient::replying(WEEK_REPLY));
        let mut session = seeded_session();
        generate_schedule_impl(&mut session, &available(&client))
            .await
            .expect("first generation");

        *client.reply.lock().expect("reply mutex poisoned") = None;
        let result = generate_schedule_impl(&mut session, &available(&client)).await;
        assert!(matches!(result, Err(InfraError::Generation(_))));
        assert_eq!(session.generated_blocks().len(), 3);
    }

    #[test]
    fn start_reminders_requires_schedule() {
        let mut session = PlannerSession::new();
        assert!(matches!(
            start_reminders_impl(&mut session),
            Err(InfraError::InvalidState(_))
        ));
        assert!(!stop_reminders_impl(&mut session));
    }

    #[tokio::test(start_paused = true)]
    async fn reminders_reach_the_foreground_channel() {
        // Monday 2026-02-16, a minute before the first generated block.
        let base = NaiveDate::from_ymd_opt(2026, 2, 16)
            .and_then(|date| date.and_hms_opt(7, 59, 0))
            .expect("base time");
        let origin = tokio::time::Instant::now();
        let clock: NowProvider = Arc::new(move || {
            base + ChronoDuration::from_std(origin.elapsed())
                .unwrap_or_else(|_| ChronoDuration::zero())
        });

        let client = Arc::new(FakeAssistantClient::replying(WEEK_REPLY));
        let mut session = seeded_session()
            .with_reminder_scheduler(ReminderScheduler::new().with_now_provider(clock));
        generate_schedule_impl(&mut session, &available(&client))
            .await
            .expect("generate schedule");

        assert_eq!(
            start_reminders_impl(&mut session).expect("start"),
            ReminderStart::Started { scheduled: 3 }
        );
        assert_eq!(
            start_reminders_impl(&mut session).expect("second start"),
            ReminderStart::AlreadyActive
        );
        assert!(session.reminders_running());

        let notice = session.next_reminder().await.expect("reminder");
        assert_eq!(notice.block.title, "Inbox zero");
        assert!(session.try_next_reminder().is_none());

        assert!(stop_reminders_impl(&mut session));
        assert!(!session.reminders_running());
    }
}
