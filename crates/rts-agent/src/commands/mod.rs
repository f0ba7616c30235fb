//! Command implementations
//!
//! This module contains implementations for all CLI subcommands.

pub mod attach;
pub mod hook;
pub mod listen;
