//! tracing subscriber setup
//!
//! Console output is compact text or JSON. A log file, when configured,
//! rotates daily and is written from a background thread.

use std::fs;
use std::path::Path;

use tracing::{Level, Subscriber};
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

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Keeps the file writer thread alive; drop it only on exit
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber for a run
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = effective_level(&settings.level, verbose, quiet);

    let (file_writer, file_guard) = match settings.file.as_deref() {
        Some(path) => {
            let (writer, guard) = open_log_file(path, settings.max_files)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(format_layer(std::io::stdout, settings.json_format, true))
        .with(file_writer.map(|writer| format_layer(writer, settings.json_format, false)))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(%level, file = ?settings.file, json = settings.json_format, "Logging initialized");

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Stderr-only logging for the config subcommands, which print results to stdout
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(format_layer(std::io::stderr, false, true))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

/// `-q` wins over `-v`; otherwise each `-v` raises the configured level
fn effective_level(configured: &str, verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => configured.parse().unwrap_or(Level::INFO),
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// RUST_LOG if set, pinned so this crate logs at `level` and HTTP internals stay quiet
fn env_filter(level: Level) -> Result<EnvFilter> {
    let own = format!("{}={}", env!("CARGO_CRATE_NAME"), level.as_str().to_lowercase());
    let base = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let filter = [own.as_str(), "hyper=warn", "reqwest=warn"]
        .into_iter()
        .try_fold(base, |filter, directive| {
            directive
                .parse::<Directive>()
                .map(|d| filter.add_directive(d))
                .map_err(|e| Error::Internal(format!("Invalid log directive '{}': {}", directive, e)))
        });
    filter
}

fn format_layer<S, W>(writer: W, json: bool, console: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(console && !json);
    match (json, console) {
        (true, _) => Box::new(
            layer
                .json()
                .with_current_span(true)
                .with_span_events(FmtSpan::CLOSE),
        ),
        (false, true) => Box::new(layer.compact().with_target(false)),
        (false, false) => Box::new(layer.with_target(true)),
    }
}

/// Daily-rotated appender named after the configured file's stem
fn open_log_file(log_file: &str, max_files: u32) -> Result<(NonBlocking, WorkerGuard)> {
    let path = Path::new(log_file);
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|e| Error::IoWrite {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let prefix = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("executor");
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files.max(1) as usize)
        .build(directory)
        .map_err(|e| Error::Internal(format!("Failed to create log file appender: {}", e)))?;

    Ok(tracing_appender::non_blocking(appender))
}
