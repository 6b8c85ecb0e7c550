use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.conf")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the detection database and push notifications (the default)
    Run {
        /// Endpoint URL, written into the config when none is set there
        post_url: Option<String>,
    },

    /// Check that the detection database is reachable and well-formed
    CheckDb {
        /// Database path (defaults to the configured database_path)
        path: Option<PathBuf>,
    },

    /// Show the resolved configuration, creating defaults when missing
    CheckConfig,
}
