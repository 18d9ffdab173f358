//! Daemon: runs the foreground scheduler and the background agent together.
//!
//! The two halves share nothing but the store; the foreground pushes each
//! new schedule to the agent over a channel.

mod agent;
mod foreground;
mod messages;


pub use agent::{BackgroundAgent, CheckReport};
pub use foreground::{ForegroundScheduler, SchedulerHandle};
pub use messages::{AgentMessage, SchedulerCommand, PERIODIC_CHECK_TAG};

use chrono::{DateTime, Local};
use daybell_core::{clock::Clock, config::Config, schedule::ScheduleEntry};
use daybell_notify::{build_sink, Notifier};
use daybell_store::{ScheduleDocument, Store};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Build the schedule from whatever the store holds right now.
pub async fn build_schedule(store: &Store, now: &DateTime<Local>) -> Vec<ScheduleEntry> {
    let tasks = store.load_tasks().await;
    let routines = store.load_routines().await;
    let settings = store.load_settings().await;
    daybell_core::schedule::build(now, &tasks, &routines, &settings)
}

/// Build and persist the schedule without arming timers. Used after
/// mutations made outside a running daemon.
pub async fn publish_schedule(
    store: &Store,
    clock: &dyn Clock,
    username: Option<String>,
) -> Result<Vec<ScheduleEntry>, daybell_core::error::DaybellError> {
    let now = clock.now();
    let schedule = build_schedule(store, &now).await;
    let doc = ScheduleDocument {
        schedule,
        username,
        published_at_ms: now.timestamp_millis(),
    };
    store.save_schedule(&doc).await?;
    Ok(doc.schedule)
}

/// Run both schedulers until Ctrl-C.
pub async fn run(cfg: &Config, store: Store, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    let sink = build_sink(&cfg.notify);
    let notifier = Notifier::connect(sink, cfg.notify.sound).await;

    info!(
        "Daybell running | notifier: {} ({}) | scheduler: {} | agent: {}",
        notifier.sink_name(),
        notifier.permission().as_str(),
        if cfg.scheduler.enabled { "on" } else { "off" },
        if cfg.agent.enabled { "on" } else { "off" },
    );

    let (agent_tx, agent_handle) = if cfg.agent.enabled {
        let (tx, rx) = mpsc::channel::<AgentMessage>(64);
        let agent = BackgroundAgent::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            cfg.agent.clone(),
        );
        (Some(tx), Some(tokio::spawn(agent.run(rx))))
    } else {
        (None, None)
    };

    let (sched, sched_handle) = if cfg.scheduler.enabled {
        let (handle, rx) = SchedulerHandle::channel();
        let mut scheduler = ForegroundScheduler::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            cfg.scheduler.refresh_interval(),
        )
        .with_due_window(cfg.agent.due_window_ms())
        .with_username(cfg.notify.username.clone());
        if let Some(tx) = &agent_tx {
            scheduler = scheduler.with_agent(tx.clone());
        }
        (Some(handle), Some(tokio::spawn(scheduler.run(rx))))
    } else {
        (None, None)
    };

    wait_for_shutdown(sched.as_ref(), agent_tx.as_ref()).await?;
    info!("Received shutdown signal");

    shutdown(sched, sched_handle, agent_tx, agent_handle).await;
    Ok(())
}

/// Wait for Ctrl-C. SIGHUP rebuilds the timers and forces an agent check.
#[cfg(unix)]
async fn wait_for_shutdown(
    sched: Option<&SchedulerHandle>,
    agent: Option<&mpsc::Sender<AgentMessage>>,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => return Ok(res?),
            _ = hangup.recv() => {
                info!("Received SIGHUP, rescheduling");
                if let Some(s) = sched {
                    s.reschedule().await;
                }
                if let Some(a) = agent {
                    let _ = a.send(AgentMessage::CheckNow).await;
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(
    _sched: Option<&SchedulerHandle>,
    _agent: Option<&mpsc::Sender<AgentMessage>>,
) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn shutdown(
    sched: Option<SchedulerHandle>,
    sched_handle: Option<JoinHandle<()>>,
    agent_tx: Option<mpsc::Sender<AgentMessage>>,
    agent_handle: Option<JoinHandle<()>>,
) {
    info!("Shutting down...");

    if let Some(s) = sched {
        s.shutdown().await;
    }
    if let Some(h) = sched_handle {
        let _ = h.await;
    }

    // Dropping the last sender ends the agent loop.
    drop(agent_tx);
    if let Some(mut h) = agent_handle {
        if tokio::time::timeout(std::time::Duration::from_secs(5), &mut h)
            .await
            .is_err()
        {
            warn!("agent: did not stop in time, aborting");
            h.abort();
        }
    }

    info!("Shutdown complete.");
}
