//! Native desktop notifications via the platform notifier CLI.
//!
//! Linux uses `notify-send` (libnotify), macOS uses `osascript`. The audible
//! alert is a terminal bell plus a short system sound when a player exists.

use async_trait::async_trait;
use daybell_core::{
    error::DaybellError, message::Notification, schedule::IconKind, traits::NotificationSink,
};
use std::io::Write;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default timeout for a notifier subprocess.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const LINUX_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/message.oga";
const MACOS_SOUND: &str = "/System/Library/Sounds/Glass.aiff";

/// Host platform, as far as notification tooling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Unsupported,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Unsupported
        }
    }
}

/// A program invocation, kept separate from `Command` so it can be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args).kill_on_drop(true);
        cmd
    }
}

/// Desktop notification sink.
pub struct DesktopSink {
    platform: Platform,
    timeout: Duration,
}

impl DesktopSink {
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = if timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(timeout_secs)
        };
        Self {
            platform: Platform::current(),
            timeout,
        }
    }

    /// Run an invocation with the configured timeout.
    async fn run(&self, inv: &Invocation, label: &str) -> Result<(), DaybellError> {
        let output = tokio::time::timeout(self.timeout, inv.command().output())
            .await
            .map_err(|_| {
                DaybellError::Notify(format!(
                    "{label} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DaybellError::Notify(format!("failed to run {label}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DaybellError::Notify(format!(
                "{label} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for DesktopSink {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DaybellError> {
        let inv = notify_invocation(self.platform, notification).ok_or_else(|| {
            DaybellError::Notify("no desktop notifier on this platform".to_string())
        })?;
        self.run(&inv, inv.program).await?;
        debug!("notify: desktop delivered {}", notification.tag);
        Ok(())
    }

    async fn play_sound(&self) -> Result<(), DaybellError> {
        // Terminal bell, then the system sound if a player exists.
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07").and_then(|_| stderr.flush());

        match sound_invocation(self.platform) {
            Some(inv) => self.run(&inv, inv.program).await,
            None => Ok(()),
        }
    }

    async fn is_available(&self) -> bool {
        match check_invocation(self.platform) {
            Some(inv) => exits_cleanly(&inv, self.timeout).await,
            None => false,
        }
    }
}

/// Freedesktop icon name for an icon kind.
pub fn freedesktop_icon(icon: IconKind) -> &'static str {
    match icon {
        IconKind::Bell => "dialog-information",
        IconKind::Task => "task-due",
        IconKind::Clock => "appointment-soon",
        IconKind::Routine => "view-refresh",
        IconKind::Check => "emblem-default",
    }
}

/// Quote a string as an AppleScript string literal.
pub fn applescript_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn notify_invocation(platform: Platform, n: &Notification) -> Option<Invocation> {
    match platform {
        Platform::Linux => Some(Invocation {
            program: "notify-send",
            args: vec![
                "--app-name=Daybell".to_string(),
                format!("--icon={}", freedesktop_icon(n.icon)),
                format!("--hint=string:x-daybell-tag:{}", n.tag),
                "--".to_string(),
                n.title.clone(),
                n.body.clone(),
            ],
        }),
        Platform::MacOs => Some(Invocation {
            program: "osascript",
            args: vec![
                "-e".to_string(),
                format!(
                    "display notification {} with title {}",
                    applescript_quote(&n.body),
                    applescript_quote(&n.title)
                ),
            ],
        }),
        Platform::Unsupported => None,
    }
}

pub fn sound_invocation(platform: Platform) -> Option<Invocation> {
    match platform {
        Platform::Linux if std::path::Path::new(LINUX_SOUND).exists() => Some(Invocation {
            program: "paplay",
            args: vec![LINUX_SOUND.to_string()],
        }),
        Platform::MacOs => Some(Invocation {
            program: "afplay",
            args: vec![MACOS_SOUND.to_string()],
        }),
        _ => None,
    }
}

/// A no-op call that succeeds only when the notifier is installed.
fn check_invocation(platform: Platform) -> Option<Invocation> {
    match platform {
        Platform::Linux => Some(Invocation {
            program: "notify-send",
            args: vec!["--version".to_string()],
        }),
        Platform::MacOs => Some(Invocation {
            program: "osascript",
            args: vec!["-e".to_string(), "return 1".to_string()],
        }),
        Platform::Unsupported => None,
    }
}

/// Whether `inv` exits successfully within `timeout`. A hung child is killed.
async fn exits_cleanly(inv: &Invocation, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, inv.command().output()).await {
        Ok(Ok(output)) => output.status.success(),
        Ok(Err(e)) => {
            debug!("notify: {} unavailable: {e}", inv.program);
            false
        }
        Err(_) => {
            debug!("notify: {} timed out after {}s", inv.program, timeout.as_secs());
            false
        }
    }
}
