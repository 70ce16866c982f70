//! CLI argument definitions using clap
//!
//! Commands:
//! - dashfilter encode --config <path>
//! - dashfilter decode <query>
//! - dashfilter describe --config <path>
//! - dashfilter apply --config <path> <query> [--write]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dashfilter - dashboard filter state tool
#[derive(Parser, Debug)]
#[command(name = "dashfilter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the compact query string of the saved filters
    Encode {
        /// Path to dashboard configuration file
        #[arg(long, default_value = "./dashboard.json")]
        config: PathBuf,
    },

    /// Print the saved filter designs encoded in a query string
    Decode {
        /// Compact filter query string
        query: String,
    },

    /// Activate the saved filters and print every bucket
    Describe {
        /// Path to dashboard configuration file
        #[arg(long, default_value = "./dashboard.json")]
        config: PathBuf,
    },

    /// Exchange the filters of a query string into the saved filters
    Apply {
        /// Path to dashboard configuration file
        #[arg(long, default_value = "./dashboard.json")]
        config: PathBuf,

        /// Compact filter query string
        query: String,

        /// Write the resulting filters back to the configuration file
        #[arg(long)]
        write: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
