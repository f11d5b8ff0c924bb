//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Register command arguments.
///
/// Fields are optional here so that missing values surface as form
/// validation errors rather than argument errors.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Visitor's full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Flat being visited (e.g. A-101)
    #[arg(short, long)]
    pub flat: Option<String>,

    /// Purpose of visit: Delivery, Guest, Maintenance or Other
    #[arg(short, long)]
    pub purpose: Option<String>,

    /// 10-digit mobile number
    #[arg(short, long)]
    pub mobile: Option<String>,

    /// Print the new record as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show records whose name or flat number contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort order (defaults to the configured order)
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Only export records whose name or flat number contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort order (defaults to the configured order)
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Directory to write the CSV file to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the CSV to stdout instead of writing a file
    #[arg(long, conflicts_with = "output_dir")]
    pub stdout: bool,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort order argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Most recent visitors first
    Newest,
    /// Earliest visitors first
    Oldest,
}

impl From<SortArg> for crate::query::SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => Self::Desc,
            SortArg::Oldest => Self::Asc,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
