use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rts_agent_core::options::AgentOptions;

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

/// Agent subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the pre-test hook once and print the dump id
    Hook {
        /// Agent options (e.g. `rts.out=target/rts,rts.cmd="tracer BINARY_RTS_PID",rts.sync`)
        #[arg(long, default_value = "")]
        agent_options: String,
    },
    /// Read test lifecycle events (JSON lines) from stdin and write the lookup record
    Listen {
        /// Agent options; only `rts.out` is used
        #[arg(long, default_value = "")]
        agent_options: String,
        /// Dump id printed by an earlier `hook` invocation
        #[arg(long)]
        dump_id: Option<String>,
    },
    /// Run the pre-test hook, print the dump id, then listen on stdin
    Attach {
        /// Agent options (e.g. `rts.out=target/rts,rts.cmd="tracer BINARY_RTS_PID",rts.sync`)
        #[arg(long, default_value = "")]
        agent_options: String,
    },
}

/// Regression test selection agent
#[derive(Debug, Parser)]
#[command(name = "rts-agent", version)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via RTS_AGENT_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None,
        };

        let log_level = match self.log_level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        if std::env::var_os("RTS_AGENT_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var(
                "RUST_LOG",
                format!("rts_agent={},rts_agent_core={}", log_level, log_level),
            );
        }
        rts_agent_core::logging::init(log_format)?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        match self.command {
            Commands::Hook { agent_options } => {
                crate::commands::hook::execute_hook(parse_options(&agent_options)?).await
            }
            Commands::Listen {
                agent_options,
                dump_id,
            } => {
                crate::commands::listen::execute_listen(parse_options(&agent_options)?, dump_id)
                    .await
            }
            Commands::Attach { agent_options } => {
                crate::commands::attach::execute_attach(parse_options(&agent_options)?).await
            }
        }
    }
}

fn parse_options(raw: &str) -> Result<AgentOptions> {
    let options = AgentOptions::parse(raw)
        .with_context(|| format!("Invalid agent options '{}'", raw))?;
    tracing::info!("Agent options: {}", options);
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_listen_with_dump_id() {
        let cli = Cli::try_parse_from([
            "rts-agent",
            "listen",
            "--agent-options",
            "rts.out=/tmp/rts",
            "--dump-id",
            "1_2",
        ])
        .unwrap();
        match cli.command {
            Commands::Listen {
                agent_options,
                dump_id,
            } => {
                assert_eq!(agent_options, "rts.out=/tmp/rts");
                assert_eq!(dump_id.as_deref(), Some("1_2"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_log_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rts-agent", "hook", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.log_format, Some(LogFormat::Json)));
    }
}
