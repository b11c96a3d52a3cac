//! Command-line interface, parsed with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// usrman - user management REST service
#[derive(Parser)]
#[command(name = "usrman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Apply database migrations and exit
    Migrate,

    /// Write a default config file (to --config, or ./config.toml)
    Init,

    /// Check whether a username is taken, with suggestions if it is
    CheckUsername {
        username: String,

        /// First name used to build suggestions
        #[arg(long)]
        first: Option<String>,

        /// Last name used to build suggestions
        #[arg(long)]
        last: Option<String>,
    },
}
