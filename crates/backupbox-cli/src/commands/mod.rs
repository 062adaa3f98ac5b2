//! CLI subcommands

pub mod config;
pub mod count;
pub mod daemon;
pub mod folders;
pub mod sync;
