//! Agent attach entry point
//!
//! Attaching prepares the output directory, fixes the process context and runs
//! the pre-test hook. The returned [`Agent`] hands out the listener that the
//! test framework reports to.

use crate::context::{AgentContext, DumpId};
use crate::errors::{AgentError, Result};
use crate::hook::{HookLauncher, HookOutcome};
use crate::listener::TestListener;
use crate::options::AgentOptions;
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument};

/// An attached agent for the current test process
#[derive(Debug)]
pub struct Agent {
    ctx: Arc<AgentContext>,
    launcher: HookLauncher,
    listener: TestListener,
}

impl Agent {
    /// Attach using the dump id of the current process
    pub fn attach(options: &AgentOptions) -> Result<Self> {
        Self::attach_with_context(AgentContext::new(options))
    }

    /// Attach with a dump id created elsewhere
    pub fn attach_with_dump_id(options: &AgentOptions, dump_id: DumpId) -> Result<Self> {
        Self::attach_with_context(AgentContext::with_dump_id(options, dump_id))
    }

    /// Attach with a fully built context
    ///
    /// Fails only when the output directory cannot be created. Hook failures
    /// are logged and leave the agent attached. The hook runs at most once per
    /// process, however many agents attach.
    #[instrument(skip_all, fields(dump_id = %ctx.dump_id))]
    pub fn attach_with_context(ctx: AgentContext) -> Result<Self> {
        let agent = Self::prepare(ctx)?;
        agent.run_hook_once();
        Ok(agent)
    }

    /// Create the output directory and build the agent without running the hook
    pub fn prepare(ctx: AgentContext) -> Result<Self> {
        info!(
            "Attaching agent to PID {} with output directory {}",
            std::process::id(),
            ctx.output_directory.display()
        );
        fs::create_dir_all(&ctx.output_directory).map_err(|source| {
            AgentError::OutputDirectory {
                path: ctx.output_directory.clone(),
                source,
            }
        })?;

        let ctx = Arc::new(ctx);
        Ok(Self {
            launcher: HookLauncher::for_process(Arc::clone(&ctx)),
            listener: TestListener::new(Arc::clone(&ctx)),
            ctx,
        })
    }

    /// Run the pre-test hook unless it already ran
    pub fn run_hook_once(&self) -> HookOutcome {
        self.launcher.run_hook_once()
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn dump_id(&self) -> &DumpId {
        &self.ctx.dump_id
    }

    pub fn listener(&self) -> &TestListener {
        &self.listener
    }

    pub fn launcher(&self) -> &HookLauncher {
        &self.launcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_attach_creates_output_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("rts");
        let options = AgentOptions {
            command: String::new(),
            output_directory: out.clone(),
            sync_command: false,
        };

        let agent = Agent::attach_with_dump_id(&options, DumpId::new("9_9")).unwrap();

        assert!(out.is_dir());
        assert_eq!(agent.dump_id().as_str(), "9_9");
        assert_eq!(agent.run_hook_once(), HookOutcome::NoCommand);
    }

    #[test]
    fn test_attach_fails_when_output_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let options = AgentOptions {
            command: String::new(),
            output_directory: blocker.join("out"),
            sync_command: false,
        };

        let result = Agent::attach(&options);
        assert!(matches!(result, Err(AgentError::OutputDirectory { .. })));
    }
}
