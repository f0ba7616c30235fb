//! Logging and observability
//!
//! Structured logging through `tracing`, with text or JSON output selected at
//! runtime. All output goes to stderr so that stdout stays free for command
//! output and for the test framework hosting the agent.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system with an optional format
///
/// Safe to call more than once; only the first call installs a subscriber.
///
/// ## Arguments
///
/// * `format` - `None` or `"text"` for human-readable text, `"json"` for
///   structured JSON. Unknown values fall back to text.
///
/// ## Environment Variables
///
/// * `RTS_AGENT_LOG_FORMAT` - Format used when `format` is `None`
/// * `RTS_AGENT_LOG` - Filter directives
/// * `RUST_LOG` - Fallback filter directives
///
/// ## Example
///
/// ```rust
/// use rts_agent_core::logging;
///
/// logging::init(None).expect("Failed to initialize logging");
/// ```
pub fn init(format: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();

        let env_format = std::env::var("RTS_AGENT_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(true).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter based on environment variables
fn create_env_filter() -> EnvFilter {
    if let Ok(agent_log) = std::env::var("RTS_AGENT_LOG") {
        EnvFilter::try_new(&agent_log).unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid RTS_AGENT_LOG specification '{}', using default 'info'",
                agent_log
            );
            EnvFilter::new("info")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
