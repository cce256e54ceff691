//! CLI subcommands.

pub mod common;
pub mod config;
pub mod geodesic;
pub mod project;
pub mod simulate;
