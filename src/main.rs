//! TeamSkills Matcher - assign team members to roles by skill similarity
//!
//! This is the main entry point for the matcher binary. It reads a match
//! request, runs the embedding pipeline, and writes the JSON response.

mod cli;
mod config;
mod embedding;
mod error;
mod logging;
mod matching;
mod types;
mod version;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{CacheSubcommand, Cli, Commands, ConfigSubcommand};
use crate::config::MatcherConfig;
use crate::embedding::DiskStore;
use crate::error::{Error, Result};
use crate::matching::RoleMatcher;
use crate::types::MatchRequest;

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        debug!(error = %e.format_for_log(), configuration = e.is_configuration(), "Command failed");
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't need the full logging setup
    match cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { ref subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone());
        }
        _ => {}
    }

    let config_path = match &cli.command {
        Commands::Match { config, .. } | Commands::Anchors { config } => config.clone(),
        Commands::Cache { subcommand } => match subcommand {
            CacheSubcommand::Stats { config } | CacheSubcommand::Clear { config } => config.clone(),
        },
        Commands::Version | Commands::Config { .. } => None,
    };
    let config = MatcherConfig::load(config_path.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    debug!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting TeamSkills matcher"
    );

    match cli.command {
        Commands::Match { input, output, pretty, .. } => run_match(config, &input, output.as_deref(), pretty),
        Commands::Anchors { .. } => {
            print_anchors(&config);
            Ok(())
        }
        Commands::Cache { subcommand } => handle_cache_command(&config, subcommand),
        // Already handled above
        Commands::Version | Commands::Config { .. } => Ok(()),
    }
}

/// Run one match request end to end
fn run_match(config: MatcherConfig, input: &str, output: Option<&str>, pretty: bool) -> Result<()> {
    let raw = read_input(input)?;
    let request = MatchRequest::from_json(&raw)?;

    info!(
        provider = %config.embedding.provider,
        model = %config.embedding.model_id(),
        cache = config.cache.enabled,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(num_cpus::get().clamp(1, 8))
        .thread_name("teamskills-matcher")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let response = runtime.block_on(async {
        let matcher = RoleMatcher::from_config(&config)?;
        matcher.run(request).await
    })?;

    let mut json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    json.push('\n');

    match output {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(path).into_owned());
            std::fs::write(&path, json).map_err(|e| Error::IoWrite {
                path: path.clone(),
                source: e,
            })?;
            info!(path = %path.display(), "Response written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Read the request from a file, or stdin for "-"
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(|e| Error::IoRead {
            path: PathBuf::from("<stdin>"),
            source: e,
        })?;
        return Ok(buf);
    }

    let path = Path::new(input);
    std::fs::read_to_string(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn print_anchors(config: &MatcherConfig) {
    let boost = &config.domain_boost;
    println!(
        "Domain boost: {} (strength {}, temperature {}, method {})",
        if boost.is_active() { "active" } else { "inactive" },
        boost.strength,
        boost.temperature,
        boost.method.name()
    );
    println!();
    for anchor in &boost.anchors {
        println!("  {:<20} {}", anchor.name, anchor.text);
    }
}

fn handle_cache_command(config: &MatcherConfig, subcommand: CacheSubcommand) -> Result<()> {
    let store = DiskStore::at(config.cache_dir());

    match subcommand {
        CacheSubcommand::Stats { .. } => {
            let summary = store.summary()?;
            println!("Cache directory: {}", summary.dir.display());
            println!("Entries:         {}", summary.entries);
            println!("Size:            {:.1} KiB", summary.bytes as f64 / 1024.0);
            if summary.unreadable > 0 {
                println!("Unreadable:      {}", summary.unreadable);
            }
            for (model, count) in &summary.models {
                println!("  {:<32} {}", model, count);
            }
        }
        CacheSubcommand::Clear { .. } => {
            let removed = store.clear()?;
            println!("Removed {} cached embeddings from {}", removed, store.dir().display());
        }
    }

    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let mut cfg = MatcherConfig::load(config.as_deref())?;
            if !cfg.embedding.api_key.is_empty() {
                cfg.embedding.api_key = "********".to_string();
            }
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            config::init_config(path.as_deref(), force)?;
        }
        ConfigSubcommand::Validate { config } => {
            MatcherConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
