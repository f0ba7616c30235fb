//! Feed test lifecycle events into the listener
//!
//! Events arrive on stdin as JSON lines, one serialized callback per line,
//! e.g. `{"event":"testStarted","description":{"className":"pkg.FooTest"}}`.
//! Lines that do not parse are reported and skipped so that a noisy producer
//! never aborts the test run.

use anyhow::{Context, Result};
use rts_agent_core::agent::Agent;
use rts_agent_core::context::{AgentContext, DumpId};
use rts_agent_core::listener::{LifecycleEvent, TestListener};
use rts_agent_core::options::AgentOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};

/// Execute the listen command
#[instrument(skip(options))]
pub async fn execute_listen(options: AgentOptions, dump_id: Option<String>) -> Result<()> {
    let dump_id = match dump_id {
        Some(id) => DumpId::new(id),
        None => {
            let own = DumpId::current();
            warn!(
                "No --dump-id given, using this process's dump id {} which matches no hook run",
                own
            );
            own
        }
    };
    let agent = Agent::prepare(AgentContext::with_dump_id(&options, dump_id))?;

    let stdin = BufReader::new(tokio::io::stdin());
    let processed = feed_events(stdin, agent.listener()).await?;
    info!("Processed {} lifecycle events", processed);
    Ok(())
}

/// Dispatch every well-formed event line from `reader` to `listener`
///
/// Returns the number of events dispatched.
pub(crate) async fn feed_events<R>(reader: R, listener: &TestListener) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut processed = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read lifecycle events")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LifecycleEvent>(line) {
            Ok(event) => {
                debug!("Lifecycle event: {:?}", event);
                listener.dispatch(&event);
                processed += 1;
            }
            Err(e) => warn!("Skipping malformed lifecycle event '{}': {}", line, e),
        }
    }

    Ok(processed)
}
