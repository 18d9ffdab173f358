//! Foreground scheduler: one in-process timer per schedule entry.
//!
//! Every rebuild replaces the whole timer set: old timers are aborted before
//! the new ones are armed, and a generation counter discards any expiry that
//! was already in flight when its timer was replaced.
//!
//! An expiry fires every published entry that is inside its due window, not
//! just its own, so entries due at the same instant all go out before the
//! rebuild. Entries that fell due but were not delivered stay in the
//! published schedule until their window closes, so the background agent
//! can retry them.

use super::build_schedule;
use super::messages::{AgentMessage, SchedulerCommand};
use daybell_core::{
    clock::Clock,
    schedule::{due_status, DueStatus, ScheduleEntry, DEFAULT_DUE_WINDOW_MS},
};
use daybell_notify::{Delivery, Notifier};
use daybell_store::{ScheduleDocument, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// A timer expiry, tagged with the generation that armed it.
#[derive(Debug)]
pub(super) struct TimerFired {
    pub generation: u64,
    pub entry: ScheduleEntry,
}

/// Cloneable handle for poking a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    pub fn channel() -> (Self, mpsc::Receiver<SchedulerCommand>) {
        let (tx, rx) = mpsc::channel(16);
        (Self { tx }, rx)
    }

    /// Ask for a rebuild. Returns `false` if the scheduler is gone.
    pub async fn reschedule(&self) -> bool {
        self.tx.send(SchedulerCommand::Reschedule).await.is_ok()
    }

    pub async fn shutdown(&self) -> bool {
        self.tx.send(SchedulerCommand::Shutdown).await.is_ok()
    }
}

/// Spawn one timer that reports `fired` after `delay`.
pub(super) fn arm(
    delay: Duration,
    fired: TimerFired,
    tx: mpsc::UnboundedSender<TimerFired>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(fired);
    })
}

pub struct ForegroundScheduler {
    store: Store,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    agent: Option<mpsc::Sender<AgentMessage>>,
    username: Option<String>,
    refresh_interval: Duration,
    due_window_ms: i64,
    /// Last schedule handed to the agent, pending entries included.
    published: Vec<ScheduleEntry>,
    timers: Vec<JoinHandle<()>>,
    generation: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
    fired_rx: mpsc::UnboundedReceiver<TimerFired>,
}

impl ForegroundScheduler {
    pub fn new(
        store: Store,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
    ) -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        Self {
            store,
            notifier,
            clock,
            agent: None,
            username: None,
            refresh_interval,
            due_window_ms: DEFAULT_DUE_WINDOW_MS,
            published: Vec::new(),
            timers: Vec::new(),
            generation: 0,
            fired_tx,
            fired_rx,
        }
    }

    /// Push every applied schedule to the background agent.
    pub fn with_agent(mut self, agent: mpsc::Sender<AgentMessage>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// How late an undelivered entry stays published for retry.
    pub fn with_due_window(mut self, window_ms: i64) -> Self {
        self.due_window_ms = window_ms;
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    #[cfg(test)]
    pub(super) fn generation(&self) -> u64 {
        self.generation
    }

    /// Timers still waiting to expire.
    #[cfg(test)]
    pub(super) fn armed(&self) -> usize {
        self.timers.iter().filter(|t| !t.is_finished()).count()
    }

    /// Rebuild from the store and apply. Returns the number of timers armed.
    pub async fn reschedule(&mut self) -> usize {
        let now = self.clock.now();
        let entries = build_schedule(&self.store, &now).await;
        let pending = self.pending_in_window(now.timestamp_millis(), &entries).await;
        self.apply_with_pending(entries, pending).await
    }

    /// Previously published entries that fell due, are still inside their
    /// window, and have no ledger claim.
    async fn pending_in_window(
        &self,
        now_ms: i64,
        rebuilt: &[ScheduleEntry],
    ) -> Vec<ScheduleEntry> {
        let due: Vec<&ScheduleEntry> = self
            .published
            .iter()
            .filter(|e| due_status(now_ms, e.due_at_ms, self.due_window_ms) == DueStatus::Due)
            .filter(|e| !rebuilt.iter().any(|r| same_occurrence(r, e)))
            .collect();
        if due.is_empty() {
            return Vec::new();
        }

        let tz = self.clock.now().timezone();
        let ledger = self.store.load_ledger().await;
        due.into_iter()
            .filter(|e| e.ledger_key(&tz).is_some_and(|k| !ledger.contains(&k)))
            .cloned()
            .collect()
    }

    /// Replace all timers with one per entry, then publish the entries for
    /// the background agent.
    pub async fn apply(&mut self, entries: Vec<ScheduleEntry>) -> usize {
        self.apply_with_pending(entries, Vec::new()).await
    }

    /// Arm `entries`; publish them together with `pending`, which get no
    /// timer of their own.
    async fn apply_with_pending(
        &mut self,
        entries: Vec<ScheduleEntry>,
        pending: Vec<ScheduleEntry>,
    ) -> usize {
        self.cancel_all();
        self.generation += 1;

        let now_ms = self.clock.now_ms();
        for entry in &entries {
            let delay = u64::try_from(entry.due_at_ms - now_ms).unwrap_or(0);
            let fired = TimerFired {
                generation: self.generation,
                entry: entry.clone(),
            };
            self.timers
                .push(arm(Duration::from_millis(delay), fired, self.fired_tx.clone()));
        }
        let armed = self.timers.len();

        let mut schedule = entries;
        if !pending.is_empty() {
            debug!("scheduler: keeping {} undelivered reminder(s) published", pending.len());
            schedule.extend(pending);
            schedule.sort_by(|a, b| a.due_at_ms.cmp(&b.due_at_ms).then_with(|| a.id.cmp(&b.id)));
        }
        self.published = schedule.clone();

        let doc = ScheduleDocument {
            schedule,
            username: self.username.clone(),
            published_at_ms: now_ms,
        };
        if let Err(e) = self.store.save_schedule(&doc).await {
            warn!("scheduler: failed to publish schedule: {e}");
        }
        if let Some(agent) = &self.agent {
            let msg = AgentMessage::SetSchedule {
                schedule: doc.schedule,
                username: doc.username,
            };
            if let Err(e) = agent.try_send(msg) {
                debug!("scheduler: schedule push to agent skipped: {e}");
            }
        }

        debug!(
            "scheduler: armed {armed} timer(s), generation {}",
            self.generation
        );
        armed
    }

    fn cancel_all(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }

    /// Handle one expiry: deliver unless stale or already fired, sweep the
    /// other published entries now in their window, then rebuild.
    pub(super) async fn on_fired(&mut self, fired: TimerFired) -> Option<Delivery> {
        if fired.generation != self.generation {
            debug!(
                "scheduler: ignoring stale timer for {} (generation {})",
                fired.entry.id, fired.generation
            );
            return None;
        }
        let delivery = self.fire(&fired.entry).await;

        let now_ms = self.clock.now_ms();
        let siblings: Vec<ScheduleEntry> = self
            .published
            .iter()
            .filter(|e| !same_occurrence(e, &fired.entry))
            .filter(|e| due_status(now_ms, e.due_at_ms, self.due_window_ms) == DueStatus::Due)
            .cloned()
            .collect();
        for entry in &siblings {
            self.fire(entry).await;
        }

        self.reschedule().await;
        delivery
    }

    async fn fire(&self, entry: &ScheduleEntry) -> Option<Delivery> {
        let tz = self.clock.now().timezone();
        let Some(key) = entry.ledger_key(&tz) else {
            warn!("scheduler: entry {} has an unrepresentable due time", entry.id);
            return None;
        };

        match self
            .store
            .claim_fired(&key, &entry.id, self.clock.now_ms())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("scheduler: {key} already fired");
                return None;
            }
            Err(e) => warn!("scheduler: ledger claim for {key} failed, delivering anyway: {e}"),
        }

        info!("scheduler: firing {}", entry.id);
        let delivery = self.notifier.show_entry(entry).await;
        if !delivery.is_delivered() {
            if let Err(e) = self.store.release_fired(&key).await {
                warn!("scheduler: failed to release {key}: {e}");
            }
        }
        Some(delivery)
    }

    /// Run until shut down. Rebuilds on start, after every expiry, on the
    /// refresh interval, and on request.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SchedulerCommand>) {
        let armed = self.reschedule().await;
        info!(
            "scheduler: started with {armed} timer(s), refresh every {}s",
            self.refresh_interval.as_secs()
        );

        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh.tick().await;

        loop {
            tokio::select! {
                Some(fired) = self.fired_rx.recv() => {
                    self.on_fired(fired).await;
                }
                _ = refresh.tick() => {
                    self.reschedule().await;
                }
                cmd = commands.recv() => match cmd {
                    Some(SchedulerCommand::Reschedule) => {
                        self.reschedule().await;
                    }
                    Some(SchedulerCommand::Shutdown) | None => break,
                },
            }
        }

        self.cancel_all();
        info!("scheduler: stopped");
    }
}

impl Drop for ForegroundScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn same_occurrence(a: &ScheduleEntry, b: &ScheduleEntry) -> bool {
    a.id == b.id && a.due_at_ms == b.due_at_ms
}
