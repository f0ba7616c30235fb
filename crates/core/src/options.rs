//! Agent option string parsing
//!
//! The agent is configured with a single comma-separated option string, e.g.
//! `rts.out=target/rts,rts.cmd="tracer BINARY_RTS_PID",rts.sync`.

use crate::errors::OptionsError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const COMMAND_KEY: &str = "rts.cmd";
const OUTPUT_KEY: &str = "rts.out";
const SYNC_KEY: &str = "rts.sync";
const OPTIONS_SEPARATOR: char = ',';
const VALUE_SEPARATOR: char = '=';

/// Parsed agent options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    /// Pre-test command; empty means no hook
    pub command: String,
    /// Absolute output directory for sync and lookup files
    pub output_directory: PathBuf,
    /// Whether to block until the pre-test command creates the sync file
    pub sync_command: bool,
}

impl AgentOptions {
    /// Parse an option string
    ///
    /// Relative output directories are resolved against the current directory.
    pub fn parse(options: &str) -> Result<Self, OptionsError> {
        let mut values = extract_options(options);

        let command = values.remove(COMMAND_KEY).unwrap_or_default();
        let output = values
            .remove(OUTPUT_KEY)
            .map(PathBuf::from)
            .unwrap_or_default();
        let sync_command = values
            .remove(SYNC_KEY)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        for key in values.keys() {
            debug!("Ignoring unknown agent option: {}", key);
        }

        Ok(Self {
            command,
            output_directory: absolutize(&output)?,
            sync_command,
        })
    }
}

impl FromStr for AgentOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AgentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AgentOptions{{command='{}', outputDirectory={}, syncCommand={}}}",
            self.command,
            self.output_directory.display(),
            self.sync_command
        )
    }
}

/// Split the option string into key/value pairs
///
/// A part without `=` (or starting with it) is a flag and maps to `"true"`.
fn extract_options(options: &str) -> HashMap<String, String> {
    options
        .split(OPTIONS_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.find(VALUE_SEPARATOR) {
            Some(idx) if idx > 0 => (
                part[..idx].to_string(),
                strip_quotes(&part[idx + 1..]).to_string(),
            ),
            _ => (part.to_string(), "true".to_string()),
        })
        .collect()
}

/// Strip one pair of surrounding double quotes, then one of single quotes
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);
    let value = value.strip_prefix('\'').unwrap_or(value);
    value.strip_suffix('\'').unwrap_or(value)
}

fn absolutize(path: &Path) -> Result<PathBuf, OptionsError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| OptionsError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    if path.as_os_str().is_empty() {
        Ok(cwd)
    } else {
        Ok(cwd.join(path))
    }
}
