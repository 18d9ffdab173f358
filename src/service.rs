//! Periodic trigger management: runs `daybell check` on a timer via a
//! macOS LaunchAgent or a Linux systemd user timer, so reminders still fire
//! when `daybell start` is not running.

use crate::daemon::PERIODIC_CHECK_TAG;
use std::path::{Path, PathBuf};

/// macOS LaunchAgent label.
const LABEL: &str = "com.daybell.check";

/// systemd unit base name (`.service` + `.timer`).
const UNIT: &str = "daybell-check";

// ---------------------------------------------------------------------------
// Pure functions (testable, no I/O)
// ---------------------------------------------------------------------------

/// Escape XML special characters for plist safety.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Generate a macOS LaunchAgent plist that runs a check every `interval_secs`.
pub fn generate_plist(
    binary_path: &str,
    config_path: &str,
    working_dir: &str,
    data_dir: &str,
    interval_secs: u64,
) -> String {
    let binary = xml_escape(binary_path);
    let config = xml_escape(config_path);
    let work = xml_escape(working_dir);
    let data = xml_escape(data_dir);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{LABEL}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{binary}</string>
        <string>-c</string>
        <string>{config}</string>
        <string>check</string>
        <string>--tag</string>
        <string>{PERIODIC_CHECK_TAG}</string>
    </array>
    <key>WorkingDirectory</key>
    <string>{work}</string>
    <key>StartInterval</key>
    <integer>{interval_secs}</integer>
    <key>RunAtLoad</key>
    <true/>
    <key>StandardOutPath</key>
    <string>{data}/check.stdout.log</string>
    <key>StandardErrorPath</key>
    <string>{data}/check.stderr.log</string>
    <key>EnvironmentVariables</key>
    <dict>
        <key>PATH</key>
        <string>/usr/local/bin:/usr/bin:/bin:/opt/homebrew/bin</string>
    </dict>
</dict>
</plist>
"#
    )
}

/// Generate the oneshot systemd user service the timer activates.
pub fn generate_systemd_service(
    binary_path: &str,
    config_path: &str,
    working_dir: &str,
    data_dir: &str,
) -> String {
    format!(
        r#"[Unit]
Description=Daybell reminder check

[Service]
Type=oneshot
ExecStart={binary_path} -c {config_path} check --tag {PERIODIC_CHECK_TAG}
WorkingDirectory={working_dir}
StandardOutput=append:{data_dir}/check.stdout.log
StandardError=append:{data_dir}/check.stderr.log
"#
    )
}

/// Generate the systemd user timer that fires every `interval_secs`.
pub fn generate_systemd_timer(interval_secs: u64) -> String {
    format!(
        r#"[Unit]
Description=Run the Daybell reminder check every {interval_secs}s

[Timer]
OnBootSec=1min
OnUnitActiveSec={interval_secs}s
AccuracySec=5s
Unit={UNIT}.service

[Install]
WantedBy=timers.target
"#
    )
}

/// Clamp the trigger interval: at least a minute, and never wider than the
/// due window, or a wake could land entirely past an entry's window.
pub fn trigger_interval(tick_secs: u64, due_window_secs: u64) -> u64 {
    tick_secs.min(due_window_secs).max(60)
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Return the unit files this platform uses, primary first.
fn service_file_paths() -> anyhow::Result<Vec<PathBuf>> {
    let home_str = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("cannot determine home directory (HOME not set)"))?;
    let home = PathBuf::from(home_str);

    if cfg!(target_os = "macos") {
        Ok(vec![home
            .join("Library")
            .join("LaunchAgents")
            .join(format!("{LABEL}.plist"))])
    } else if cfg!(target_os = "linux") {
        let dir = home.join(".config").join("systemd").join("user");
        Ok(vec![
            dir.join(format!("{UNIT}.timer")),
            dir.join(format!("{UNIT}.service")),
        ])
    } else {
        anyhow::bail!("Unsupported OS — only macOS and Linux are supported for periodic checks");
    }
}

// ---------------------------------------------------------------------------
// I/O functions (interactive, use cliclack)
// ---------------------------------------------------------------------------

/// Install the periodic reminder check.
pub fn install(config_path: &str, data_dir: &str, interval_secs: u64) -> anyhow::Result<()> {
    cliclack::intro(console::style("daybell service install").bold().to_string())?;

    // 1. Resolve binary path.
    let binary = std::env::current_exe()
        .and_then(|p| p.canonicalize())
        .map_err(|e| anyhow::anyhow!("cannot resolve binary path: {e}"))?;
    let binary_str = binary.display().to_string();
    cliclack::log::info(format!("Binary: {binary_str}"))?;

    // 2. Resolve config path, bail if missing.
    let config_abs = Path::new(config_path).canonicalize().map_err(|_| {
        anyhow::anyhow!("config file '{config_path}' not found — run `daybell init` first")
    })?;
    let config_str = config_abs.display().to_string();
    cliclack::log::info(format!("Config: {config_str}"))?;

    // 3. Working directory = parent of config file.
    let working_dir = config_abs
        .parent()
        .unwrap_or(Path::new("/"))
        .display()
        .to_string();

    let data_dir = daybell_core::shellexpand(data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let paths = service_file_paths()?;
    for p in &paths {
        cliclack::log::info(format!("Unit file: {}", p.display()))?;
    }

    // 4. If already installed, ask to overwrite and stop the old trigger first.
    if paths[0].exists() {
        let overwrite: bool = cliclack::confirm("Periodic check already installed. Overwrite?")
            .initial_value(true)
            .interact()?;
        if !overwrite {
            cliclack::outro("Cancelled — existing trigger unchanged")?;
            return Ok(());
        }
        stop_service(&paths[0]);
    }

    // 5. Generate and write content.
    let files: Vec<(PathBuf, String)> = if cfg!(target_os = "macos") {
        vec![(
            paths[0].clone(),
            generate_plist(
                &binary_str,
                &config_str,
                &working_dir,
                &data_dir,
                interval_secs,
            ),
        )]
    } else {
        vec![
            (paths[0].clone(), generate_systemd_timer(interval_secs)),
            (
                paths[1].clone(),
                generate_systemd_service(&binary_str, &config_str, &working_dir, &data_dir),
            ),
        ]
    };
    for (path, content) in &files {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        cliclack::log::success(format!("Wrote {}", path.display()))?;
    }

    // 6. Activate.
    let spinner = cliclack::spinner();
    spinner.start("Activating periodic check...");
    if activate_service(&paths[0]) {
        spinner.stop("Periodic check activated");
    } else {
        spinner.error("Activation returned an error — check logs");
    }

    cliclack::outro(format!(
        "Reminders will be checked every {interval_secs}s, even when Daybell is closed"
    ))?;
    Ok(())
}

/// Remove the periodic reminder check.
pub fn uninstall() -> anyhow::Result<()> {
    cliclack::intro(console::style("daybell service uninstall").bold().to_string())?;

    let paths = service_file_paths()?;
    if !paths.iter().any(|p| p.exists()) {
        cliclack::outro("No periodic check installed — nothing to do")?;
        return Ok(());
    }

    let spinner = cliclack::spinner();
    spinner.start("Stopping periodic check...");
    stop_service(&paths[0]);
    spinner.stop("Periodic check stopped");

    for path in paths.iter().filter(|p| p.exists()) {
        std::fs::remove_file(path)?;
        cliclack::log::success(format!("Removed {}", path.display()))?;
    }
    if cfg!(target_os = "linux") {
        let _ = std::process::Command::new("systemctl")
            .args(["--user", "daemon-reload"])
            .output();
    }

    cliclack::outro("Periodic check removed")?;
    Ok(())
}

/// Check trigger installation and activation status.
pub fn status() -> anyhow::Result<()> {
    cliclack::intro(console::style("daybell service status").bold().to_string())?;

    let paths = service_file_paths()?;
    if !paths[0].exists() {
        cliclack::log::warning("Periodic check is not installed")?;
        cliclack::log::info("Run `daybell service install` to set it up")?;
        cliclack::outro("Done")?;
        return Ok(());
    }

    cliclack::log::success(format!("Installed: {}", paths[0].display()))?;
    if is_active() {
        cliclack::log::success("Status: active")?;
    } else {
        cliclack::log::warning("Status: not active")?;
    }

    cliclack::outro("Done")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Platform helpers (subprocess calls)
// ---------------------------------------------------------------------------

/// Stop / unload the trigger.
fn stop_service(primary: &Path) {
    if cfg!(target_os = "macos") {
        let _ = std::process::Command::new("launchctl")
            .args(["unload", &primary.display().to_string()])
            .output();
    } else {
        let _ = std::process::Command::new("systemctl")
            .args(["--user", "disable", "--now", &format!("{UNIT}.timer")])
            .output();
    }
}

/// Activate / load the trigger. Returns true on success.
fn activate_service(primary: &Path) -> bool {
    if cfg!(target_os = "macos") {
        std::process::Command::new("launchctl")
            .args(["load", &primary.display().to_string()])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    } else {
        let _ = std::process::Command::new("systemctl")
            .args(["--user", "daemon-reload"])
            .output();
        std::process::Command::new("systemctl")
            .args(["--user", "enable", "--now", &format!("{UNIT}.timer")])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// Whether the trigger is currently loaded / scheduled.
fn is_active() -> bool {
    if cfg!(target_os = "macos") {
        std::process::Command::new("launchctl")
            .args(["list"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(LABEL))
            .unwrap_or(false)
    } else {
        std::process::Command::new("systemctl")
            .args(["--user", "is-active", "--quiet", &format!("{UNIT}.timer")])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
