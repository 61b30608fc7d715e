use std::path::PathBuf;

use clap::Parser;

/// Query file metadata from a fleet of remote hosts and print one combined
/// table.
#[derive(Debug, Parser)]
#[command(name = "fleetstat", version, about)]
pub struct Cli {
    /// Path(s) to get metadata about
    #[arg(long = "path", value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// Make outputted values human readable
    #[arg(long)]
    pub humanize: bool,

    /// Recursively lookup subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Only query targets with these addresses (default: all configured)
    #[arg(long = "target", value_name = "ADDRESS")]
    pub targets: Vec<String>,

    /// Read targets from this file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub targets_file: Option<PathBuf>,
}
