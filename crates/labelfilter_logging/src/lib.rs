//! Shared logging setup for labelfilter binaries.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "labelfilter=info";
const HOME_ENV_VAR: &str = "LABELFILTER_HOME";

/// Logging configuration for a labelfilter binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Also append plain-text logs to `<logs_dir>/<app_name>.log`.
    pub log_to_file: bool,
}

/// Initialize tracing with stderr output and an optional log file.
///
/// `RUST_LOG` overrides the default filter. Without `verbose`, stderr only
/// shows warnings so command output stays readable.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = if config.log_to_file {
        let dir = ensure_logs_dir().context("Failed to ensure log directory")?;
        let writer = SharedFileWriter::open(&dir, config.app_name)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Get the labelfilter home directory: ~/.labelfilter
pub fn labelfilter_home() -> Option<PathBuf> {
    if let Ok(override_path) = std::env::var(HOME_ENV_VAR) {
        return Some(PathBuf::from(override_path));
    }
    dirs::home_dir().map(|home| home.join(".labelfilter"))
}

/// Get the logs directory: ~/.labelfilter/logs
pub fn logs_dir() -> Option<PathBuf> {
    labelfilter_home().map(|home| home.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir().context("Could not determine home directory")?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl SharedFileWriter {
    fn open(dir: &Path, app_name: &str) -> io::Result<Self> {
        let path = dir.join(format!("{}.log", sanitize_name(app_name)));
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        file.flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
