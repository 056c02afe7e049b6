//! Logging system configuration and initialization
//!
//! - Console output on stderr so report output on stdout stays clean
//! - Optional file output, JSON formatted if requested
//! - `RUST_LOG` overrides the configured level
//! - The previous log file is renamed with its timestamp on startup

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

const LOG_FILE_NAME: &str = "dental-leads.log";

/// Dependency targets kept quiet unless tracing is requested
const QUIET_TARGETS: [&str; 5] = [
    "sqlx::query=warn",
    "sqlx::sqlite=warn",
    "reqwest=info",
    "hyper=warn",
    "html5ever=warn",
];

// Keeps the non-blocking file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with milliseconds
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory the log file is written to
pub fn get_log_directory(config: &LoggingConfig) -> Result<PathBuf> {
    match &config.log_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(ConfigManager::get_app_data_dir()?.join("logs")),
    }
}

/// Rename an existing log file to `<stem>.<timestamp>.log`
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {e}"))?;
    let file_time = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamp = chrono::DateTime::<Local>::from(file_time).format("%Y%m%dT%H%M%S");

    let file_stem = log_file_name.trim_end_matches(".log");
    let rotated = log_dir.join(format!("{file_stem}.{stamp}.log"));
    std::fs::rename(&log_file_path, &rotated).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {e}",
            log_file_path.display(),
            rotated.display()
        )
    })?;

    Ok(Some(rotated))
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow!("Invalid log level '{level}': {e}"))?;
    if !level.to_lowercase().contains("trace") {
        for directive in QUIET_TARGETS {
            filter = filter.add_directive(directive.parse()?);
        }
    }
    Ok(filter)
}

/// Install the global subscriber
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config.level)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    let mut rotated = None;
    let log_dir = if config.file_output {
        let dir = get_log_directory(config)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("Failed to create log directory {}: {e}", dir.display()))?;
        rotated = rotate_existing_log_file(&dir, LOG_FILE_NAME)?;
        Some(dir)
    } else {
        None
    };

    match (&log_dir, config.json_format) {
        (Some(dir), true) => {
            let (file_writer, file_guard) = non_blocking(rolling::never(dir, LOG_FILE_NAME));
            store_guard(file_guard)?;
            let file_layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            registry.with(console_layer).with(file_layer).try_init()?;
        }
        (Some(dir), false) => {
            let (file_writer, file_guard) = non_blocking(rolling::never(dir, LOG_FILE_NAME));
            store_guard(file_guard)?;
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            registry.with(console_layer).with(file_layer).try_init()?;
        }
        (None, _) if config.console_output => {
            registry.with(console_layer).try_init()?;
        }
        (None, _) => return Err(anyhow!("No logging output configured")),
    }

    info!("Logging system initialized (level: {})", config.level);
    if let Some(dir) = &log_dir {
        info!("Log directory: {}", dir.display());
    }
    if let Some(path) = rotated {
        info!("Rotated previous log file to: {}", path.display());
    }
    Ok(())
}

fn store_guard(guard: tracing_appender::non_blocking::WorkerGuard) -> Result<()> {
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("log guard registry poisoned"))?
        .push(guard);
    Ok(())
}
