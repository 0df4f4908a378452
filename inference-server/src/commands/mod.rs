//! CLI subcommands

pub mod analyze;
pub mod generate;
pub mod predict;
pub mod serve;
pub mod train;
