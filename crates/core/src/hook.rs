//! Pre-test hook execution
//!
//! Runs the user's pre-test command once per process through the platform
//! shell, with the process id and the sync file path injected into its
//! environment. In sync mode the calling thread is blocked until the command
//! creates the sync file or the wait ceiling is reached.
//!
//! The spawned process is never supervised: its output is discarded and its
//! exit status is not collected.

use crate::context::{AgentContext, SyncPolicy};
use crate::env_template::{wrap_reserved_variables, PID_KEY, SYNC_FILE_KEY};
use crate::errors::{error_chain, HookError};
use crate::platform::ShellFlavor;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// What a call to [`HookLauncher::run_hook_once`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// A previous call already ran the command
    AlreadyExecuted,
    /// No pre-test command is configured
    NoCommand,
    /// The command was started; `sync` is set when sync mode was requested
    Launched { sync: Option<SyncOutcome> },
    /// Starting or waiting failed; the next call will try again
    Failed,
}

/// How the sync wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The sync file appeared after the given time
    Ready(Duration),
    /// The ceiling was reached without the sync file
    TimedOut(Duration),
}

impl SyncOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            SyncOutcome::Ready(elapsed) | SyncOutcome::TimedOut(elapsed) => *elapsed,
        }
    }
}

/// Executed flag shared by every launcher built with [`HookLauncher::for_process`]
static PROCESS_HOOK_EXECUTED: Lazy<Arc<Mutex<bool>>> =
    Lazy::new(|| Arc::new(Mutex::new(false)));

/// Launches the pre-test command at most once
#[derive(Debug)]
pub struct HookLauncher {
    ctx: Arc<AgentContext>,
    shell: ShellFlavor,
    executed: Arc<Mutex<bool>>,
}

impl HookLauncher {
    /// Launcher using the host platform shell and its own executed flag
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self::with_shell(ctx, ShellFlavor::host())
    }

    /// Launcher using an explicit shell flavor and its own executed flag
    pub fn with_shell(ctx: Arc<AgentContext>, shell: ShellFlavor) -> Self {
        Self {
            ctx,
            shell,
            executed: Arc::new(Mutex::new(false)),
        }
    }

    /// Launcher bound to the process-wide executed flag
    ///
    /// All launchers built this way share one flag, so the command runs at most
    /// once per process no matter how many agents attach.
    pub fn for_process(ctx: Arc<AgentContext>) -> Self {
        Self {
            ctx,
            shell: ShellFlavor::host(),
            executed: Arc::clone(&PROCESS_HOOK_EXECUTED),
        }
    }

    /// Whether the command has run to completion (including the sync wait)
    pub fn has_executed(&self) -> bool {
        *self.executed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the pre-test command unless it already ran
    ///
    /// Never fails: errors are logged and reported as [`HookOutcome::Failed`],
    /// leaving the hook eligible for another attempt. The executed flag is held
    /// for the whole launch so concurrent callers cannot start it twice.
    #[instrument(skip(self), fields(dump_id = %self.ctx.dump_id))]
    pub fn run_hook_once(&self) -> HookOutcome {
        let mut executed = self.executed.lock().unwrap_or_else(PoisonError::into_inner);

        if *executed {
            info!("Pre-test hook already executed, skipping");
            return HookOutcome::AlreadyExecuted;
        }

        if self.ctx.command.is_empty() {
            info!("No pre-test command specified");
            return HookOutcome::NoCommand;
        }

        match self.launch() {
            Ok(sync) => {
                *executed = true;
                HookOutcome::Launched { sync }
            }
            Err(e) => {
                error!("Failed to start pre-test hook: {}", error_chain(&e));
                HookOutcome::Failed
            }
        }
    }

    fn launch(&self) -> Result<Option<SyncOutcome>, HookError> {
        let command = wrap_reserved_variables(&self.ctx.command, self.shell);
        let sync_file = absolute_sync_file(&self.ctx.sentinel_path())?;
        let pid = std::process::id().to_string();

        let mut process = self.shell.command(&command);
        process
            .env(PID_KEY, &pid)
            .env(SYNC_FILE_KEY, &sync_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        info!(
            "Running pre-test command ({}): {:?}",
            pid,
            self.shell.argv(&command)
        );

        let child = process.spawn().map_err(|source| HookError::Spawn {
            command: command.clone(),
            source,
        })?;
        debug!("Pre-test command started with pid {}", child.id());

        if !self.ctx.sync_command {
            return Ok(None);
        }

        let outcome = wait_for_sync_file(&sync_file, self.ctx.sync_policy)?;
        Ok(Some(outcome))
    }
}

/// Block until `path` exists or `policy.max_wait` has elapsed
///
/// The file is checked immediately and then once per poll interval. The last
/// sleep is shortened so the wait never overshoots the ceiling by more than a
/// check. Reaching the ceiling is not an error.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn wait_for_sync_file(path: &Path, policy: SyncPolicy) -> Result<SyncOutcome, HookError> {
    let start = Instant::now();

    loop {
        let exists = path.try_exists().map_err(|source| HookError::SyncFile {
            path: path.to_path_buf(),
            source,
        })?;
        let elapsed = start.elapsed();

        if exists {
            info!("Sync file available after {:?}", elapsed);
            return Ok(SyncOutcome::Ready(elapsed));
        }
        if elapsed >= policy.max_wait {
            warn!(
                "Sync file did not appear within {:?}, continuing",
                policy.max_wait
            );
            return Ok(SyncOutcome::TimedOut(elapsed));
        }

        debug!("Waiting for sync file at: {}", path.display());
        thread::sleep(policy.poll_interval.min(policy.max_wait - elapsed));
    }
}

fn absolute_sync_file(path: &Path) -> Result<PathBuf, HookError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| HookError::SyncFile {
            path: path.to_path_buf(),
            source,
        })
}
