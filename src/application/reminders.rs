use crate::domain::models::{ClockTime, TimeBlock, Weekday};
use crate::infrastructure::error::InfraError;
use chrono::{Datelike, Days, Duration as ChronoDuration, Local, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
const FIRE_WINDOW_SECONDS: i64 = 60;

pub type NowProvider = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Dedup identity of a reminder within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub day: Weekday,
    pub start: ClockTime,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    pub block: TimeBlock,
    pub fire_at: NaiveDateTime,
}

impl ReminderEntry {
    pub fn key(&self) -> ReminderKey {
        ReminderKey {
            day: self.block.day,
            start: self.block.start,
            title: self.block.title.clone(),
        }
    }

    fn is_due(&self, now: NaiveDateTime) -> bool {
        self.fire_at <= now && now < self.fire_at + ChronoDuration::seconds(FIRE_WINDOW_SECONDS)
    }
}

/// Fire event handed back to the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotice {
    pub block: TimeBlock,
    pub fire_at: NaiveDateTime,
}

impl ReminderNotice {
    pub fn message(&self) -> String {
        format!(
            "{}\n{} {}-{}\n{}",
            self.block.title, self.block.day, self.block.start, self.block.end, self.block.details
        )
    }
}

/// Next occurrence of the block's start at or after `now`: this week's
/// weekday/time, pushed one week forward if it already passed.
pub fn next_fire_time(block: &TimeBlock, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = block.start.to_naive_time()?;
    let monday = now
        .date()
        .checked_sub_days(Days::new(u64::from(now.weekday().num_days_from_monday())))?;
    let fire_at = monday
        .checked_add_days(Days::new(block.day.index() as u64))?
        .and_time(start);
    if fire_at < now {
        return fire_at.checked_add_signed(ChronoDuration::weeks(1));
    }
    Some(fire_at)
}

pub fn schedule_entries(blocks: &[TimeBlock], now: NaiveDateTime) -> Vec<ReminderEntry> {
    blocks
        .iter()
        .filter_map(|block| {
            let fire_at = next_fire_time(block, now);
            if fire_at.is_none() {
                warn!(title = %block.title, start = %block.start, "block has no reminder time");
            }
            fire_at.map(|fire_at| ReminderEntry {
                block: block.clone(),
                fire_at,
            })
        })
        .collect()
}

/// Per-run state of the poll loop: fixed fire times plus the identities
/// already delivered. Fire times are never recomputed, so each identity
/// fires at most once per run.
#[derive(Debug, Clone)]
pub struct ReminderRun {
    entries: Vec<ReminderEntry>,
    fired: HashSet<ReminderKey>,
}

impl ReminderRun {
    pub fn new(blocks: &[TimeBlock], now: NaiveDateTime) -> Self {
        Self {
            entries: schedule_entries(blocks, now),
            fired: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[ReminderEntry] {
        &self.entries
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    /// One reminder cycle: everything whose window contains `now` and has
    /// not fired yet.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<ReminderNotice> {
        let mut notices = Vec::new();
        for entry in &self.entries {
            if entry.is_due(now) && self.fired.insert(entry.key()) {
                notices.push(ReminderNotice {
                    block: entry.block.clone(),
                    fire_at: entry.fire_at,
                });
            }
        }
        notices
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStart {
    Started { scheduled: usize },
    AlreadyActive,
}

struct ReminderWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns at most one background poll loop. The loop works on the block
/// snapshot it was started with and reports through the given channel.
pub struct ReminderScheduler {
    poll_interval: Duration,
    now_provider: NowProvider,
    worker: Option<ReminderWorker>,
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            now_provider: Arc::new(|| Local::now().naive_local()),
            worker: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Spawns the poll loop on the current tokio runtime.
    pub fn start(
        &mut self,
        blocks: Arc<[TimeBlock]>,
        sink: UnboundedSender<ReminderNotice>,
    ) -> Result<ReminderStart, InfraError> {
        if self.is_running() {
            return Ok(ReminderStart::AlreadyActive);
        }
        let runtime = Handle::try_current().map_err(|error| {
            InfraError::InvalidState(format!("reminders need a tokio runtime: {error}"))
        })?;

        let run = ReminderRun::new(&blocks, (self.now_provider)());
        let scheduled = run.entries().len();
        let stop = Arc::new(AtomicBool::new(false));
        let handle = runtime.spawn(run_loop(
            run,
            Arc::clone(&stop),
            sink,
            self.poll_interval,
            Arc::clone(&self.now_provider),
        ));
        self.worker = Some(ReminderWorker { stop, handle });

        info!(scheduled, "reminder loop started");
        Ok(ReminderStart::Started { scheduled })
    }

    /// Asks the loop to exit at its next tick. Returns whether one was
    /// running.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        worker.stop.store(true, Ordering::SeqCst);
        !worker.handle.is_finished()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.as_ref() {
            worker.stop.store(true, Ordering::SeqCst);
        }
    }
}

async fn run_loop(
    mut run: ReminderRun,
    stop: Arc<AtomicBool>,
    sink: UnboundedSender<ReminderNotice>,
    poll_interval: Duration,
    now_provider: NowProvider,
) {
    loop {
        if stop.load(Ordering::SeqCst) {
            info!(fired = run.fired_count(), "reminder loop stopped");
            return;
        }

        let now = now_provider();
        for notice in run.due(now) {
            debug!(title = %notice.block.title, fire_at = %notice.fire_at, "delivering reminder");
            if sink.send(notice).is_err() {
                warn!("reminder receiver dropped; ending reminder loop");
                return;
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}
