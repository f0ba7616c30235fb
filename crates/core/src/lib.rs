//! Core library for the regression test selection agent
//!
//! This crate contains the pre-test hook launcher, the test identity resolver
//! and the correlation log writer, along with option parsing, logging and
//! error handling.

pub mod agent;
pub mod context;
pub mod correlation;
pub mod env_template;
pub mod errors;
pub mod hook;
pub mod identity;
pub mod listener;
pub mod logging;
pub mod options;
pub mod platform;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let version = version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }
}
