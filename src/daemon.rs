//! Daemon process control and runtime state
//!
//! A running daemon owns two files in the runtime directory: the PID file,
//! and `state.json` describing what it serves (version, start time,
//! database) and the outcome of its latest tick. `tn status` reads both.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scheduler::TickReport;

/// Current version from git describe (set at compile time)
pub const VERSION: &str = env!("GIT_DESCRIBE");

const PID_FILE: &str = "tasknotify.pid";
const STATE_FILE: &str = "state.json";

/// How long `stop` waits for a graceful exit before SIGKILL
const STOP_GRACE: Duration = Duration::from_secs(5);
const STOP_POLL: Duration = Duration::from_millis(100);

fn default_runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tasknotify")
}

/// What the running daemon publishes about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonState {
    pub pid: u32,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub db_path: PathBuf,
    pub last_tick: Option<TickReport>,
}

/// Answer to `tn status`
#[derive(Debug, Serialize)]
pub struct DaemonStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub pid_file: PathBuf,
    /// Only reported for the live daemon; leftovers from a crash are ignored
    pub state: Option<DaemonState>,
}

/// Starts, stops and inspects the notification daemon
#[derive(Debug)]
pub struct DaemonManager {
    dir: PathBuf,
}

impl Default for DaemonManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonManager {
    pub fn new() -> Self {
        Self::in_dir(default_runtime_dir())
    }

    /// Keep runtime files under `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "DaemonManager::in_dir: called");
        Self { dir }
    }

    pub fn pid_file(&self) -> PathBuf {
        self.dir.join(PID_FILE)
    }

    fn state_file(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// PID of the live daemon, if any
    pub fn running_pid(&self) -> Option<u32> {
        let pid: u32 = fs::read_to_string(self.pid_file()).ok()?.trim().parse().ok()?;
        let alive = process_alive(pid);
        debug!(pid, alive, "DaemonManager::running_pid: checked");
        alive.then_some(pid)
    }

    /// Spawn `tn run-daemon` detached
    ///
    /// An explicit config path is forwarded so the daemon sees the same settings.
    pub fn start(&self, config_path: Option<&Path>) -> Result<u32> {
        debug!(?config_path, "DaemonManager::start: called");
        if let Some(pid) = self.running_pid() {
            return Err(eyre!("Daemon already running with PID {}", pid));
        }

        let exe = std::env::current_exe().context("Failed to get current executable")?;
        let mut command = Command::new(&exe);
        if let Some(path) = config_path {
            let path = path.canonicalize().context("Failed to resolve config path")?;
            command.arg("--config").arg(path);
        }

        let child = command
            .arg("run-daemon")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn daemon process")?;

        // The child re-registers itself once running
        let pid = child.id();
        self.write_pid(pid)?;
        info!(pid, "Daemon started");
        Ok(pid)
    }

    /// SIGTERM the daemon, escalating to SIGKILL after a grace period
    pub fn stop(&self) -> Result<u32> {
        debug!("DaemonManager::stop: called");
        let pid = self.running_pid().ok_or_else(|| eyre!("Daemon is not running"))?;

        info!(pid, "Stopping daemon");
        signal(pid, Signal::Terminate).context("Failed to send SIGTERM")?;

        let deadline = std::time::Instant::now() + STOP_GRACE;
        while process_alive(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(STOP_POLL);
        }

        if process_alive(pid) {
            warn!(pid, "Daemon did not stop gracefully, sending SIGKILL");
            if let Err(e) = signal(pid, Signal::Kill) {
                warn!(pid, error = %e, "SIGKILL failed");
            }
        }

        self.unregister()?;
        info!(pid, "Daemon stopped");
        Ok(pid)
    }

    /// Record this process as the daemon serving `db_path`
    pub fn register(&self, db_path: &Path) -> Result<()> {
        let state = DaemonState {
            pid: std::process::id(),
            version: VERSION.to_string(),
            started_at: Utc::now(),
            db_path: db_path.to_path_buf(),
            last_tick: None,
        };
        debug!(pid = state.pid, ?db_path, "DaemonManager::register: called");
        self.write_pid(state.pid)?;
        self.write_state(&state)?;
        info!(pid = state.pid, version = VERSION, "Daemon registered");
        Ok(())
    }

    /// Publish the outcome of the latest tick
    pub fn record_tick(&self, report: &TickReport) -> Result<()> {
        debug!(now = %report.now, "DaemonManager::record_tick: called");
        let mut state = self.read_state().ok_or_else(|| eyre!("Daemon state missing; was it registered?"))?;
        state.last_tick = Some(report.clone());
        self.write_state(&state)
    }

    /// Remove the PID and state files; missing files are fine
    pub fn unregister(&self) -> Result<()> {
        debug!("DaemonManager::unregister: called");
        for path in [self.pid_file(), self.state_file()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(?path, "DaemonManager::unregister: removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(format!("Failed to remove {}", path.display())),
            }
        }
        Ok(())
    }

    pub fn read_state(&self) -> Option<DaemonState> {
        let contents = fs::read_to_string(self.state_file()).ok()?;
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable daemon state file");
                None
            }
        }
    }

    pub fn status(&self) -> DaemonStatus {
        let pid = self.running_pid();
        let state = pid.and_then(|pid| self.read_state().filter(|state| state.pid == pid));
        DaemonStatus {
            running: pid.is_some(),
            pid,
            pid_file: self.pid_file(),
            state,
        }
    }

    fn write_pid(&self, pid: u32) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create runtime directory")?;
        fs::write(self.pid_file(), pid.to_string()).context("Failed to write PID file")
    }

    /// Replaced atomically through a temp file
    fn write_state(&self, state: &DaemonState) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create runtime directory")?;
        let json = serde_json::to_string_pretty(state).context("Failed to serialize daemon state")?;
        let tmp = self.dir.join(format!("{STATE_FILE}.tmp"));
        fs::write(&tmp, json).context("Failed to write daemon state")?;
        fs::rename(&tmp, self.state_file()).context("Failed to replace daemon state")
    }
}

enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal(pid: u32, sig: Signal) -> Result<()> {
    use nix::sys::signal::{Signal as NixSignal, kill};
    use nix::unistd::Pid;

    let sig = match sig {
        Signal::Terminate => NixSignal::SIGTERM,
        Signal::Kill => NixSignal::SIGKILL,
    };
    kill(Pid::from_raw(pid as i32), sig)?;
    Ok(())
}

#[cfg(not(unix))]
fn signal(pid: u32, _sig: Signal) -> Result<()> {
    Err(eyre!("Signalling PID {} is only supported on unix", pid))
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    // Signal 0 only checks that the process exists
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    false
}
