mod commands;
mod daemon;
mod init;
mod service;

use clap::{Parser, Subcommand};
use commands::{CommandContext, NotifyAction, RoutineAction, TaskAction};
use daybell_core::{
    clock::{Clock, SystemClock},
    config::{self, Config},
    shellexpand,
};
use daybell_notify::{build_sink, Notifier};
use daybell_store::Store;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "daybell",
    version,
    about = "Daybell — tasks, routines, and reminders that actually fire"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the foreground scheduler and background agent until Ctrl-C.
    Start,
    /// Show notifier, schedule, and ledger status.
    Status,
    /// Manage one-time tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage recurring routines.
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },
    /// Reminder settings and notifier checks.
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },
    /// Rebuild, publish, and print today's remaining reminders.
    Schedule {
        /// Print entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run one background check (invoked by the periodic trigger).
    Check {
        #[arg(long, default_value = daemon::PERIODIC_CHECK_TAG)]
        tag: String,
    },
    /// Interactive setup wizard.
    Init,
    /// Manage the periodic background check.
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Install the periodic check (LaunchAgent or systemd timer).
    Install,
    /// Remove the periodic check.
    Uninstall,
    /// Show whether the periodic check is installed and active.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        return init::run().await;
    }

    let cfg = config::load(&cli.config)?;
    let long_running = matches!(cli.command, Commands::Start | Commands::Check { .. });
    let _log_guard = init_logging(&cfg, long_running)?;

    if let Commands::Service { action } = &cli.command {
        return match action {
            ServiceAction::Install => service::install(
                &cli.config,
                &cfg.daybell.data_dir,
                service::trigger_interval(cfg.agent.tick_secs, cfg.agent.due_window_secs),
            ),
            ServiceAction::Uninstall => service::uninstall(),
            ServiceAction::Status => service::status(),
        };
    }

    let store = Store::new(&cfg.store).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let notifier = Notifier::new(build_sink(&cfg.notify), cfg.notify.sound);
    let ctx = CommandContext {
        store: &store,
        clock: clock.as_ref(),
        notifier: &notifier,
        username: cfg.notify.username.as_deref(),
    };

    let output = match cli.command {
        Commands::Start => {
            println!("Daybell — starting scheduler...");
            daemon::run(&cfg, store.clone(), clock.clone()).await?;
            return Ok(());
        }
        Commands::Check { tag } => {
            let notifier = Notifier::connect(build_sink(&cfg.notify), cfg.notify.sound).await;
            let mut agent =
                daemon::BackgroundAgent::new(store.clone(), notifier, clock.clone(), cfg.agent.clone());
            match agent
                .handle(daemon::AgentMessage::PeriodicTrigger { tag: tag.clone() })
                .await
            {
                Some(report) => report.to_string(),
                None => format!("Ignored trigger '{tag}'"),
            }
        }
        Commands::Schedule { json: true } => {
            let entries =
                daemon::publish_schedule(&store, clock.as_ref(), cfg.notify.username.clone())
                    .await?;
            serde_json::to_string_pretty(&entries)?
        }
        Commands::Schedule { json: false } => commands::handle_schedule(&ctx).await?,
        Commands::Status => commands::handle_status(&ctx, &cfg, &cli.config).await,
        Commands::Task { action } => commands::handle_task(action, &ctx).await?,
        Commands::Routine { action } => commands::handle_routine(action, &ctx).await?,
        Commands::Notify { action } => commands::handle_notify(action, &ctx).await?,
        Commands::Init | Commands::Service { .. } => return Ok(()),
    };
    println!("{output}");

    Ok(())
}

/// Install the tracing subscriber: stderr plus a daily-rolling file under
/// `<data_dir>/logs`. One-shot CLI commands keep stderr at `warn` unless
/// `RUST_LOG` says otherwise, so their output stays readable.
fn init_logging(cfg: &Config, long_running: bool) -> anyhow::Result<WorkerGuard> {
    let log_dir = std::path::Path::new(&shellexpand(&cfg.daybell.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "daybell.log"));

    let level = cfg.daybell.log_level.as_str();
    let stderr_default = if long_running { level } else { "warn" };
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_default));
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(stderr_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}
