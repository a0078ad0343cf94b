//! prefkit CLI
//!
//! Library half of the `prefkit` binary: argument parsing, configuration
//! and subcommand execution, kept separate from `main` so they can be
//! tested without a terminal.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
