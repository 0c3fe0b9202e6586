//! Command-line interface for bloodbank.
//!
//! This module provides the CLI structure for the `bloodbank` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DonorCommand, InventoryCommand, OutputFormat, RegisterArgs, RequestCommand,
    StatsCommand, SubmitArgs,
};

use crate::config::Config;
use crate::logging::Verbosity;

/// bloodbank - Track blood donors, stock and requests
///
/// Registers donors, keeps per-group unit counts and accepts blood requests
/// against available stock.
#[derive(Debug, Parser)]
#[command(name = "bloodbank")]
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
    /// Register and look up donors
    #[command(subcommand)]
    Donor(DonorCommand),

    /// Submit and list blood requests
    #[command(subcommand)]
    Request(RequestCommand),

    /// Show units and stock level per blood group
    Inventory(InventoryCommand),

    /// Show donor, unit and request totals
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether this command can change ledger state.
    #[must_use]
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Donor(DonorCommand::Register(_)) | Self::Request(RequestCommand::Submit(_))
        )
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The file `config validate` should check, or `None` for other commands.
    ///
    /// `--file` wins over the global `--config`, which wins over the default
    /// location. Only this file is loaded.
    #[must_use]
    pub fn config_to_validate(&self) -> Option<PathBuf> {
        let Command::Config(ConfigCommand::Validate { file }) = &self.command else {
            return None;
        };
        Some(
            file.clone()
                .or_else(|| self.config.clone())
                .unwrap_or_else(Config::default_config_path),
        )
    }
}
