//! Command-line interface for visitlog.
//!
//! This module provides the CLI structure for the `visitlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ClearCommand, ConfigCommand, ExportCommand, ListCommand, OutputFormat, RegisterCommand,
    SortArg, StatusCommand,
};

/// visitlog - Building visitor register
///
/// Registers visitors, then searches, sorts, exports and clears the log.
/// Records are kept in a local database between runs.
#[derive(Debug, Parser)]
#[command(name = "visitlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new visitor
    Register(RegisterCommand),

    /// List visitors
    List(ListCommand),

    /// Export visitors to a CSV file
    Export(ExportCommand),

    /// Permanently delete every visitor record
    Clear(ClearCommand),

    /// Show register and storage status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
