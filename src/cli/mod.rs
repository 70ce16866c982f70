//! CLI module for dashfilter
//!
//! Provides command-line interface for:
//! - encode: Saved filters to a compact query string
//! - decode: Compact query string to saved filters
//! - describe: Active buckets of the saved filters
//! - apply: Exchange query filters into the saved filters

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, decode, describe, encode, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{write_json, write_line};
