//! Attach: run the pre-test hook, then listen for lifecycle events
//!
//! The single-process equivalent of `hook` followed by `listen`, sharing one
//! dump id.

use anyhow::Result;
use rts_agent_core::options::AgentOptions;
use tokio::io::BufReader;
use tracing::{info, instrument};

use crate::commands::hook::attach;
use crate::commands::listen::feed_events;

/// Execute the attach command
#[instrument(skip(options))]
pub async fn execute_attach(options: AgentOptions) -> Result<()> {
    let agent = attach(options).await?;
    println!("{}", agent.dump_id());

    let stdin = BufReader::new(tokio::io::stdin());
    let processed = feed_events(stdin, agent.listener()).await?;
    info!(
        "Processed {} lifecycle events for dump {}",
        processed,
        agent.dump_id()
    );
    Ok(())
}
