//! Run the pre-test hook
//!
//! Attaches the agent (creating the output directory), runs the pre-test
//! command once and prints the dump id so that later `listen` invocations can
//! reuse it.

use anyhow::{Context, Result};
use rts_agent_core::agent::Agent;
use rts_agent_core::options::AgentOptions;
use tracing::instrument;

/// Execute the hook command
#[instrument(skip(options))]
pub async fn execute_hook(options: AgentOptions) -> Result<()> {
    let agent = attach(options).await?;
    println!("{}", agent.dump_id());
    Ok(())
}

/// Attach on a blocking thread; sync mode may hold it up to the wait ceiling
pub(crate) async fn attach(options: AgentOptions) -> Result<Agent> {
    let agent = tokio::task::spawn_blocking(move || Agent::attach(&options))
        .await
        .context("Agent attach task failed")??;
    Ok(agent)
}
