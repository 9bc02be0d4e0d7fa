//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the TeamSkills matcher.

use clap::{Parser, Subcommand};

/// TeamSkills Matcher - assign team members to roles by skill similarity
///
/// Reads roles and member profiles as JSON, embeds them, and prints the
/// assignment with per-role candidate reports.
#[derive(Parser, Debug)]
#[command(name = "teamskills-matcher")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match members to roles
    Match {
        /// Request JSON file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Write the response here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Path to configuration file
        #[arg(short, long, env = "TEAMSKILLS_CONFIG")]
        config: Option<String>,

        /// Pretty-print the response JSON
        #[arg(long)]
        pretty: bool,
    },

    /// List the configured domain anchors
    Anchors {
        /// Path to configuration file
        #[arg(short, long, env = "TEAMSKILLS_CONFIG")]
        config: Option<String>,
    },

    /// Embedding cache maintenance
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Cache subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CacheSubcommand {
    /// Show entry counts and size of the disk cache
    Stats {
        /// Path to configuration file
        #[arg(short, long, env = "TEAMSKILLS_CONFIG")]
        config: Option<String>,
    },

    /// Delete every cached embedding
    Clear {
        /// Path to configuration file
        #[arg(short, long, env = "TEAMSKILLS_CONFIG")]
        config: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
