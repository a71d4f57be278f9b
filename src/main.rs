//! TaskNotify - task reminder and overdue notification daemon
//!
//! CLI entry point for running and managing the notification scheduler.

use std::fs;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{info, warn};

use tasknotify::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use tasknotify::config::Config;
use tasknotify::daemon::DaemonManager;
use tasknotify::notifier::{EmailTransport, LogTransport, Notifier, TemplateSet, build_transport};
use tasknotify::repository::{StoreRepository, TaskRepository};
use tasknotify::scheduler::{NotificationScheduler, SystemClock};
use taskstore::Store;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows daemon status
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "TaskNotify loaded config: transport={}, tick_interval_secs={}",
        config.email.transport, config.scheduler.tick_interval_secs
    );

    match cli.command {
        Some(Command::Start { foreground }) => cmd_start(&config, cli.config.as_deref(), foreground).await,
        Some(Command::Stop) => cmd_stop().await,
        Some(Command::Status { format }) => cmd_status(&config, format).await,
        Some(Command::Logs { follow, lines }) => cmd_logs(follow, lines).await,
        Some(Command::Tick { dry_run, format }) => cmd_tick(&config, dry_run, format).await,
        Some(Command::Config) => cmd_config(&config),
        Some(Command::RunDaemon) => cmd_run_daemon(&config).await,
        None => print_help_with_status(),
    }
}

/// Print help with daemon status
fn print_help_with_status() -> Result<()> {
    let mut cmd = Cli::command();
    cmd.print_help()?;
    println!();
    println!();
    print!("{}", generate_after_help());
    Ok(())
}

/// Start the daemon
async fn cmd_start(config: &Config, config_path: Option<&std::path::Path>, foreground: bool) -> Result<()> {
    let daemon = DaemonManager::new();

    if let Some(pid) = daemon.running_pid() {
        println!("TaskNotify is already running (PID: {})", pid);
        return Ok(());
    }

    // Fail here rather than in a detached process nobody is watching
    config.validate().context("Invalid configuration")?;

    if foreground {
        println!("Starting TaskNotify in foreground mode...");
        run_daemon(config, &daemon).await
    } else {
        let pid = daemon.start(config_path)?;
        println!("TaskNotify started (PID: {})", pid);
        Ok(())
    }
}

/// Stop the daemon
async fn cmd_stop() -> Result<()> {
    let daemon = DaemonManager::new();

    if daemon.running_pid().is_none() {
        println!("TaskNotify is not running");
        return Ok(());
    }

    let pid = daemon.stop()?;
    println!("TaskNotify stopped (was PID: {})", pid);
    Ok(())
}

/// Show daemon status
async fn cmd_status(config: &Config, format: OutputFormat) -> Result<()> {
    let status = DaemonManager::new().status();
    let state = status.state.as_ref();
    let db_path = state
        .map(|s| s.db_path.clone())
        .unwrap_or_else(|| config.storage.expanded_db_path());

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "running": status.running,
                "pid": status.pid,
                "pid_file": status.pid_file.to_string_lossy(),
                "version": state.map(|s| &s.version),
                "started_at": state.map(|s| s.started_at),
                "db_path": db_path.to_string_lossy(),
                "last_tick": state.and_then(|s| s.last_tick.as_ref()),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("TaskNotify Status");
            println!("-----------------");
            match status.pid {
                Some(pid) => {
                    println!("Status: running");
                    println!("PID: {}", pid);
                }
                None => println!("Status: stopped"),
            }
            if let Some(state) = state {
                println!("Version: {}", state.version);
                println!("Started: {}", state.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            println!("PID file: {}", status.pid_file.display());
            println!("Database: {}", db_path.display());
            match state.and_then(|s| s.last_tick.as_ref()) {
                Some(report) => {
                    println!();
                    print!("Last {}", report);
                }
                None if status.running => println!("Last tick: none yet"),
                None => {}
            }
        }
    }

    Ok(())
}

/// Show logs
async fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        println!("The daemon may not have been started yet.");
        return Ok(());
    }

    if follow {
        println!("Following log file: {} (Ctrl+C to stop)", log_path.display());
        println!();

        let mut child = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&log_path)
            .spawn()
            .context("Failed to run tail -f")?;

        child.wait()?;
    } else {
        let file = fs::File::open(&log_path).context("Failed to open log file")?;
        let reader = BufReader::new(file);
        let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

        let start = all_lines.len().saturating_sub(lines);
        for line in &all_lines[start..] {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Run exactly one evaluation pass and print what happened
async fn cmd_tick(config: &Config, dry_run: bool, format: OutputFormat) -> Result<()> {
    if dry_run {
        config.scheduler.validate().context("Invalid scheduler configuration")?;
    } else {
        config.validate().context("Invalid configuration")?;
    }

    let scheduler = build_scheduler(config, dry_run)?;
    let report = scheduler.tick().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if dry_run {
                println!("Dry run: emails were logged, not sent");
            }
            print!("{}", report);
        }
    }

    Ok(())
}

/// Print the effective configuration as YAML
fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize config")?);
    Ok(())
}

/// Run as the daemon process (internal command)
async fn cmd_run_daemon(config: &Config) -> Result<()> {
    run_daemon(config, &DaemonManager::new()).await
}

/// Open the store and wire the scheduler to it
fn build_scheduler(config: &Config, dry_run: bool) -> Result<NotificationScheduler> {
    let db_path = config.storage.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let store = Store::open(&db_path).context(format!("Failed to open task store at {}", db_path.display()))?;
    let repo: Arc<dyn TaskRepository> = Arc::new(StoreRepository::new(store));
    info!("Task store opened: {}", db_path.display());

    let templates_dir = config.email.expanded_templates_dir();
    let templates = TemplateSet::load(templates_dir.as_deref()).context("Failed to load email templates")?;

    let transport: Arc<dyn EmailTransport> = if dry_run {
        Arc::new(LogTransport::new())
    } else {
        build_transport(&config.email).context("Failed to create email transport")?
    };
    info!("Email transport: {}", transport.name());

    let notifier = Arc::new(Notifier::new(templates, transport));
    let scheduler = NotificationScheduler::new(config.scheduler.clone(), repo, notifier, Arc::new(SystemClock))?;
    Ok(scheduler)
}

/// Run the daemon main loop
async fn run_daemon(config: &Config, daemon: &DaemonManager) -> Result<()> {
    info!("Daemon starting...");

    config.validate().context("Invalid configuration")?;
    info!("Startup validation passed");

    let scheduler = Arc::new(build_scheduler(config, false)?);
    daemon.register(&config.storage.expanded_db_path())?;

    let handle = scheduler.spawn();
    let mut reports = handle.reports();
    info!("Daemon running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sighup = signal(SignalKind::hangup())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                Ok(()) = reports.changed() => {
                    let report = reports.borrow_and_update().clone();
                    if let Some(report) = report {
                        if let Err(e) = daemon.record_tick(&report) {
                            warn!(error = %e, "Failed to record tick in daemon state");
                        }
                    }
                }
                _ = sighup.recv() => {
                    info!("SIGHUP received - configuration is read at startup, restart to apply changes");
                }
                _ = sigint.recv() => {
                    warn!("SIGINT received");
                    break;
                }
                _ = sigterm.recv() => {
                    warn!("SIGTERM received");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        warn!("Ctrl+C received");
    }

    info!("Shutting down scheduler...");
    handle.shutdown().await.context("Scheduler task failed")?;
    daemon.unregister()?;
    info!("Daemon stopped");
    Ok(())
}
