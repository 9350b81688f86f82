//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plume static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to the site root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: plume.toml)
    #[arg(short = 'C', long, default_value = crate::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new site
    New {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Empty the output directory and generate the site
    Generate,

    /// Generate the site, then serve the output directory locally
    Run {
        /// The port to serve on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Deploy the previously generated output
    Deploy,
}

#[allow(unused)]
impl Cli {
    pub const fn is_new(&self) -> bool {
        matches!(self.command, Commands::New { .. })
    }
    pub const fn is_deploy(&self) -> bool {
        matches!(self.command, Commands::Deploy)
    }
}
