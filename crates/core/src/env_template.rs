//! Environment references inside the pre-test command
//!
//! Users write the reserved variable names literally, e.g.
//! `my-tracer --pid BINARY_RTS_PID`. Before the command is handed to the shell
//! each bare occurrence is turned into a shell environment reference so the
//! shell expands it from the child's environment.

use crate::platform::ShellFlavor;
use regex::{Captures, Regex};

/// Environment variable holding the process id of the instrumented process
pub const PID_KEY: &str = "BINARY_RTS_PID";

/// Environment variable holding the absolute path of the sync file
pub const SYNC_FILE_KEY: &str = "BINARY_RTS_PRE_TEST_SYNC_FILE";

/// Wrap every bare occurrence of `env_var` in `command` for `flavor`
///
/// `Cmd` produces `%NAME%` and `Bash` produces `${NAME}`. Occurrences already
/// preceded by the shell's reference syntax (`%` for `Cmd`, `$` or `{` for
/// `Bash`) are left alone, which makes wrapping idempotent.
pub fn wrap_environment_variable(command: &str, env_var: &str, flavor: ShellFlavor) -> String {
    let escaped = regex::escape(env_var);
    let pattern = match flavor {
        ShellFlavor::Cmd => format!("(^|[^%])({})", escaped),
        ShellFlavor::Bash => format!("(^|[^${{])({})", escaped),
    };
    let regex = Regex::new(&pattern).expect("Escaped environment variable pattern should be valid");

    regex
        .replace_all(command, |caps: &Captures| match flavor {
            ShellFlavor::Cmd => format!("{}%{}%", &caps[1], &caps[2]),
            ShellFlavor::Bash => format!("{}${{{}}}", &caps[1], &caps[2]),
        })
        .into_owned()
}

/// Wrap both reserved variables, process id first
pub fn wrap_reserved_variables(command: &str, flavor: ShellFlavor) -> String {
    let command = wrap_environment_variable(command, PID_KEY, flavor);
    wrap_environment_variable(&command, SYNC_FILE_KEY, flavor)
}
