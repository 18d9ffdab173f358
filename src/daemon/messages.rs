//! Typed messages between the foreground scheduler and the background agent.

use daybell_core::schedule::ScheduleEntry;

/// Tag carried by the platform periodic trigger.
pub const PERIODIC_CHECK_TAG: &str = "check-notifications";

/// Foreground → background agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    /// Latest schedule, pushed after every rebuild.
    SetSchedule {
        schedule: Vec<ScheduleEntry>,
        username: Option<String>,
    },
    /// Force an immediate re-check.
    CheckNow,
    /// Wake from the platform periodic trigger (cron, launchd, systemd timer).
    PeriodicTrigger { tag: String },
}

/// Control messages for a running foreground scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Rebuild from the store and re-arm every timer.
    Reschedule,
    Shutdown,
}
