//! Logging setup on tracing + tracing-subscriber
//!
//! The console layer always writes to stderr: `match` prints its JSON
//! response on stdout and nothing else may land there. An optional rolling
//! file layer (tracing-appender) records the same events with source
//! locations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Dependencies that log every connection at debug
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper", "reqwest", "rustls"];

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Keeps the non-blocking file writer alive; dropping it flushes pending
/// entries
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber for a full command run
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = determine_level(settings, verbose, quiet);
    let filter = build_env_filter(level)?;

    let console = event_layer(std::io::stderr, settings.json_format, Detail::Console);

    let (file, file_guard) = match settings.file.as_deref() {
        Some(path) => {
            let (writer, guard) = open_log_file(path, settings.max_file_size_mb, settings.max_files)?;
            (Some(event_layer(writer, settings.json_format, Detail::File)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %level,
        file = ?settings.file,
        json = settings.json_format,
        "Logging initialized"
    );

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Console-only logging for commands that run before configuration loads
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_env_filter(level)?)
        .with(event_layer(std::io::stderr, false, Detail::Console))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// `--quiet` wins over `-v`; otherwise each `-v` steps down from the
/// configured level
fn determine_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => parse_level(&settings.level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` if set, else `level` everywhere; this crate always follows
/// `level` and the HTTP stack is capped at warn
fn build_env_filter(level: Level) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    filter = filter.add_directive(directive(&format!("teamskills_matcher={}", level))?);
    for dependency in QUIET_DEPENDENCIES {
        filter = filter.add_directive(directive(&format!("{}=warn", dependency))?);
    }
    Ok(filter)
}

fn directive(text: &str) -> Result<Directive> {
    text.parse::<Directive>()
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", text, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detail {
    /// Short lines for people watching stderr
    Console,
    /// Thread ids and source locations, no colour
    File,
}

fn event_layer<S, W>(writer: W, json: bool, detail: Detail) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let verbose = json || detail == Detail::File;
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_ansi(detail == Detail::Console && !json);

    if json {
        Box::new(base.json().with_span_events(FmtSpan::CLOSE))
    } else if detail == Detail::Console {
        Box::new(base.compact())
    } else {
        Box::new(base)
    }
}

/// Split `path` into the appender directory and file prefix, creating the
/// directory when needed
fn log_file_parts(path: &str) -> Result<(PathBuf, String)> {
    let path = Path::new(path);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    fs::create_dir_all(&directory).map_err(|e| Error::IoWrite {
        path: directory.clone(),
        source: e,
    })?;

    let prefix = path
        .file_stem()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("matcher")
        .to_string();

    Ok((directory, prefix))
}

fn open_log_file(path: &str, max_size_mb: u64, max_files: u32) -> Result<(NonBlocking, WorkerGuard)> {
    let (directory, prefix) = log_file_parts(path)?;

    // No size-based rotation in tracing-appender; small caps rotate hourly
    let rotation = if max_size_mb > 0 && max_size_mb < 10 {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files.max(1) as usize)
        .build(&directory)
        .map_err(|e| Error::IoWrite {
            path: directory.clone(),
            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
        })?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level(" warning "), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("loud"), Level::INFO);
    }

    #[test]
    fn test_quiet_beats_verbose() {
        let settings = LoggingSettings::default();
        assert_eq!(determine_level(&settings, 2, true), Level::ERROR);
    }

    #[test]
    fn test_verbose_steps() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(determine_level(&settings, 0, false), Level::WARN);
        assert_eq!(determine_level(&settings, 1, false), Level::DEBUG);
        assert_eq!(determine_level(&settings, 5, false), Level::TRACE);
    }

    #[test]
    fn test_env_filter_builds() {
        assert!(build_env_filter(Level::INFO).is_ok());
        assert!(build_env_filter(Level::TRACE).is_ok());
    }

    #[test]
    fn test_log_file_parts() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("matcher.log");

        let (dir, prefix) = log_file_parts(log_path.to_str().unwrap()).unwrap();
        assert_eq!(dir, temp_dir.path().join("logs"));
        assert_eq!(prefix, "matcher");
        assert!(dir.exists());
    }

    #[test]
    fn test_open_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("matcher.log");
        assert!(open_log_file(log_path.to_str().unwrap(), 5, 2).is_ok());
    }
}
