//! Platform shell selection
//!
//! The pre-test command is always run through the platform shell. The same
//! choice decides how environment variable references are written inside the
//! command text.

use std::process::Command;

/// Shell family used to run the pre-test command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `cmd /c`, environment references written as `%NAME%`
    Cmd,
    /// `bash -c`, environment references written as `${NAME}`
    Bash,
}

impl ShellFlavor {
    /// Shell flavor of the host platform
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            ShellFlavor::Cmd
        } else {
            ShellFlavor::Bash
        }
    }

    /// Shell program name
    pub fn program(self) -> &'static str {
        match self {
            ShellFlavor::Cmd => "cmd",
            ShellFlavor::Bash => "bash",
        }
    }

    /// Flag that makes the shell run a command string
    pub fn command_flag(self) -> &'static str {
        match self {
            ShellFlavor::Cmd => "/c",
            ShellFlavor::Bash => "-c",
        }
    }

    /// Full argument vector for running `command` through this shell
    pub fn argv(self, command: &str) -> [String; 3] {
        [
            self.program().to_string(),
            self.command_flag().to_string(),
            command.to_string(),
        ]
    }

    /// Build a [`Command`] running `command` through this shell
    pub fn command(self, command: &str) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args([self.command_flag(), command]);
        cmd
    }
}
