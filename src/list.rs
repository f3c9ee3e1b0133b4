//! Functionality related to the `scqc list` command.

pub mod command;
