//! CLI subcommand implementations.

pub mod chart;
pub mod regions;
pub mod stats;
pub mod util;
