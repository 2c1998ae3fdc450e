//! Lodging log CLI library.
//!
//! This crate provides the CLI interface for the lodging log charts and reports.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, RangeArgs};
pub use config::Config;
