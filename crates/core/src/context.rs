//! Process context shared by the hook launcher and the test listener
//!
//! The dump id and output directory are fixed when the agent starts. They are
//! carried in an [`AgentContext`] value instead of process-global mutable state.

use crate::options::AgentOptions;
use once_cell::sync::Lazy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the lookup file mapping dump ids to test identities
pub const LOOKUP_FILE_NAME: &str = "dump-lookup.log";

/// Default interval between sync file checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling for the sync wait
pub const DEFAULT_MAX_SYNC_WAIT: Duration = Duration::from_millis(60_000);

static PROCESS_DUMP_ID: Lazy<DumpId> = Lazy::new(|| {
    DumpId::from_parts(std::process::id(), chrono::Utc::now().timestamp_millis())
});

/// Identifier of the instrumentation dump belonging to one test process
///
/// Formatted as `<processId>_<startupEpochMillis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DumpId(String);

impl DumpId {
    /// The dump id of the current process, computed on first use
    pub fn current() -> Self {
        PROCESS_DUMP_ID.clone()
    }

    /// Build a dump id from a process id and epoch milliseconds
    pub fn from_parts(pid: u32, epoch_millis: i64) -> Self {
        Self(format!("{}_{}", pid, epoch_millis))
    }

    /// Wrap an existing dump id, e.g. one handed over by another process
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DumpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Polling behavior while waiting for the sync file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Time between existence checks
    pub poll_interval: Duration,
    /// Elapsed time after which waiting stops regardless of the sync file
    pub max_wait: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_SYNC_WAIT,
        }
    }
}

/// Immutable configuration of one instrumented test process
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub dump_id: DumpId,
    pub output_directory: PathBuf,
    pub command: String,
    pub sync_command: bool,
    pub sync_policy: SyncPolicy,
}

impl AgentContext {
    /// Context for the current process
    pub fn new(options: &AgentOptions) -> Self {
        Self::with_dump_id(options, DumpId::current())
    }

    /// Context with an explicit dump id
    pub fn with_dump_id(options: &AgentOptions, dump_id: DumpId) -> Self {
        Self {
            dump_id,
            output_directory: options.output_directory.clone(),
            command: options.command.clone(),
            sync_command: options.sync_command,
            sync_policy: SyncPolicy::default(),
        }
    }

    /// Override the sync polling behavior
    pub fn with_sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.sync_policy = policy;
        self
    }

    /// `<outputDirectory>/<dumpId>.log`
    pub fn sentinel_path(&self) -> PathBuf {
        self.output_directory.join(format!("{}.log", self.dump_id))
    }

    /// `<outputDirectory>/dump-lookup.log`
    pub fn lookup_file_path(&self) -> PathBuf {
        self.output_directory.join(LOOKUP_FILE_NAME)
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}
