//! Background agent: fires what the foreground timers missed.
//!
//! Works only from the persisted schedule and the fired ledger. It never
//! touches foreground state.

use super::messages::{AgentMessage, PERIODIC_CHECK_TAG};
use daybell_core::{
    clock::Clock,
    config::AgentConfig,
    schedule::{due_status, DueStatus, FiredLedger},
};
use daybell_notify::Notifier;
use daybell_store::{ScheduleDocument, Store};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// What one wake did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Entry ids delivered on this wake.
    pub fired: Vec<String>,
    pub already_fired: usize,
    pub missed: usize,
    pub upcoming: usize,
    /// Due, but the notifier did not deliver. Left unclaimed for the next wake.
    pub undelivered: usize,
    pub pruned: u64,
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.fired.is_empty() {
            write!(f, "Nothing due")?;
        } else {
            write!(f, "Fired: {}", self.fired.join(", "))?;
        }
        write!(
            f,
            " | upcoming {} | already fired {} | missed {}",
            self.upcoming, self.already_fired, self.missed
        )?;
        if self.undelivered > 0 {
            write!(f, " | undelivered {}", self.undelivered)?;
        }
        if self.pruned > 0 {
            write!(f, " | pruned {}", self.pruned)?;
        }
        Ok(())
    }
}

pub struct BackgroundAgent {
    store: Store,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    config: AgentConfig,
    last_pruned_ms: Option<i64>,
}

impl BackgroundAgent {
    pub fn new(store: Store, notifier: Notifier, clock: Arc<dyn Clock>, config: AgentConfig) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
            last_pruned_ms: None,
        }
    }

    /// React to one message. `None` when the message did not cause a check.
    pub async fn handle(&mut self, msg: AgentMessage) -> Option<CheckReport> {
        match msg {
            AgentMessage::SetSchedule { schedule, username } => {
                let doc = ScheduleDocument {
                    schedule,
                    username,
                    published_at_ms: self.clock.now_ms(),
                };
                if let Err(e) = self.store.save_schedule(&doc).await {
                    warn!("agent: failed to store pushed schedule: {e}");
                }
                debug!("agent: received schedule with {} entries", doc.schedule.len());
                Some(self.check().await)
            }
            AgentMessage::CheckNow => Some(self.check().await),
            AgentMessage::PeriodicTrigger { tag } if tag == PERIODIC_CHECK_TAG => {
                Some(self.check().await)
            }
            AgentMessage::PeriodicTrigger { tag } => {
                debug!("agent: ignoring periodic trigger '{tag}'");
                None
            }
        }
    }

    /// One wake: fire every persisted entry that is due and not yet fired.
    pub async fn check(&mut self) -> CheckReport {
        let mut report = CheckReport::default();
        let doc = self.store.load_schedule().await;
        let ledger = self.store.load_ledger().await;
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let tz = now.timezone();
        let window_ms = self.config.due_window_ms();

        for entry in &doc.schedule {
            let Some(key) = entry.ledger_key(&tz) else {
                continue;
            };
            if ledger.contains(&key) {
                report.already_fired += 1;
                continue;
            }

            match due_status(now_ms, entry.due_at_ms, window_ms) {
                DueStatus::Upcoming => report.upcoming += 1,
                DueStatus::Missed => {
                    debug!("agent: {} missed its window", entry.id);
                    report.missed += 1;
                }
                DueStatus::Due => {
                    match self.store.claim_fired(&key, &entry.id, now_ms).await {
                        Ok(true) => {}
                        Ok(false) => {
                            report.already_fired += 1;
                            continue;
                        }
                        Err(e) => {
                            warn!("agent: ledger claim for {key} failed, delivering anyway: {e}")
                        }
                    }

                    if self.notifier.show_entry(entry).await.is_delivered() {
                        info!("agent: fired {}", entry.id);
                        report.fired.push(entry.id.clone());
                    } else {
                        report.undelivered += 1;
                        if let Err(e) = self.store.release_fired(&key).await {
                            warn!("agent: failed to release {key}: {e}");
                        }
                    }
                }
            }
        }

        report.pruned = self.prune_if_due(now_ms).await;
        report
    }

    async fn prune_if_due(&mut self, now_ms: i64) -> u64 {
        let interval_ms = i64::try_from(self.config.prune_interval_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(HOUR_MS);
        if self
            .last_pruned_ms
            .is_some_and(|last| now_ms - last < interval_ms)
        {
            return 0;
        }

        let cutoff = FiredLedger::retention_cutoff(now_ms, self.config.ledger_retention_days);
        match self.store.prune_ledger(cutoff).await {
            Ok(n) => {
                self.last_pruned_ms = Some(now_ms);
                if n > 0 {
                    info!("agent: pruned {n} fired-ledger key(s)");
                }
                n
            }
            Err(e) => {
                warn!("agent: ledger prune failed: {e}");
                0
            }
        }
    }

    /// Run until the message channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<AgentMessage>) {
        info!(
            "agent: started, tick every {}s, due window {}s",
            self.config.tick().as_secs(),
            self.config.due_window_secs
        );
        let mut tick = tokio::time::interval(self.config.tick());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.check().await;
                }
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        self.handle(msg).await;
                    }
                    None => break,
                },
            }
        }
        info!("agent: stopped");
    }
}
