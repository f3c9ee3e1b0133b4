//! Utilities that are used across the `scqc` subcommands.

pub mod display;
pub mod glob;
