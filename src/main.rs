//! Headless driver: loads a session seed, generates the week and optionally
//! stays up to print reminders.

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weekplan::{
    add_goal_impl, add_task_impl, format_week, generate_schedule_impl, load_scheduler_config_from_env,
    start_reminders_impl, stop_reminders_impl, toggle_busy_impl, GoalInput, GptScheduler,
    PlannerSession, ReminderStart, ReqwestAssistantClient, TaskInput, Weekday,
};

/// Weekly planner: asks the scheduling assistant for a week of focus blocks.
#[derive(Parser)]
#[command(name = "weekplan", version, about)]
struct Cli {
    /// JSON file with goals, tasks and busy hours.
    #[arg(short, long)]
    session: PathBuf,

    /// Keep running and print reminders until Ctrl-C.
    #[arg(long)]
    remind: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionSeed {
    goals: Vec<GoalSeed>,
    tasks: Vec<TaskSeed>,
    busy: BTreeMap<Weekday, Vec<u8>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoalSeed {
    name: String,
    difficulty: String,
    notes: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskSeed {
    name: String,
    duration_hours: f64,
    difficulty: String,
    goal: Option<String>,
    notes: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weekplan=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut session = PlannerSession::new();
    load_seed(&mut session, &cli.session)?;

    let config = load_scheduler_config_from_env()?;
    let scheduler = GptScheduler::new(config, Arc::new(ReqwestAssistantClient::new()));
    let schedule = generate_schedule_impl(&mut session, &scheduler)
        .await
        .map_err(|error| anyhow::anyhow!(session.command_error("generate_schedule", &error)))?;

    for conflict in &schedule.conflicts {
        println!("Conflict: {conflict}");
    }
    println!("{}", format_week(&schedule.blocks, session.busy()));

    if !cli.remind {
        return Ok(());
    }
    run_reminders(&mut session).await
}

fn load_seed(session: &mut PlannerSession, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let seed: SessionSeed = serde_json::from_str(&raw)
        .with_context(|| format!("invalid session file {}", path.display()))?;

    for goal in seed.goals {
        add_goal_impl(
            session,
            GoalInput {
                name: goal.name,
                difficulty: goal.difficulty,
                notes: goal.notes,
            },
        )
        .map_err(|error| anyhow::anyhow!(session.command_error("add_goal", &error)))?;
    }
    for task in seed.tasks {
        add_task_impl(
            session,
            TaskInput {
                name: task.name,
                duration_hours: task.duration_hours.to_string(),
                difficulty: task.difficulty,
                goal: task.goal.unwrap_or_default(),
                notes: task.notes,
            },
        )
        .map_err(|error| anyhow::anyhow!(session.command_error("add_task", &error)))?;
    }
    for (day, hours) in seed.busy {
        for hour in hours {
            if !session.busy().is_busy(day, hour) {
                toggle_busy_impl(session, day, hour)
                    .map_err(|error| anyhow::anyhow!(session.command_error("toggle_busy", &error)))?;
            }
        }
    }

    info!(
        tasks = session.tasks().len(),
        goals = session.goals().len(),
        "session loaded"
    );
    Ok(())
}

async fn run_reminders(session: &mut PlannerSession) -> anyhow::Result<()> {
    let started = start_reminders_impl(session)
        .map_err(|error| anyhow::anyhow!(session.command_error("start_reminders", &error)))?;
    if let ReminderStart::Started { scheduled } = started {
        println!("Reminders scheduled for {scheduled} block(s). Press Ctrl-C to stop.");
    }

    loop {
        tokio::select! {
            notice = session.next_reminder() => {
                let Some(notice) = notice else { break };
                println!("\nReminder\n{}", notice.message());
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    stop_reminders_impl(session);
    Ok(())
}
