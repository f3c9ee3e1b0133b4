//! Functionality related to the `scqc run` command.

pub mod command;
