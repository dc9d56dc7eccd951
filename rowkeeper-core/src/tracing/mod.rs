//! Structured logging setup for hosts embedding the engine
//!
//! The engine itself only emits `tracing` events and spans. Hosts that do
//! not install their own subscriber can call [`init_tracing`] once at
//! startup. Span names used by the engine are collected in [`span_names`]
//! so log queries stay stable.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter target for engine events
const CRATE_TARGET: &str = "rowkeeper_core";

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

static TRACING_CONFIG: OnceLock<TracingConfig> = OnceLock::new();

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// The subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// The custom filter string did not parse
    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// The log file could not be created
    #[error("Failed to create log file: {0}")]
    FileCreationFailed(String),
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings and info (default)
    #[default]
    Info,
    /// Gesture transitions and repairs
    Debug,
    /// Every pointer event
    Trace,
}

impl TracingLevel {
    /// Converts to the `tracing` crate's level
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
    /// A file, truncated on startup
    File(PathBuf),
}

/// Configuration for [`init_tracing`]
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Log level for engine events
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Custom `EnvFilter` directive (overrides level if set)
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets a custom filter directive
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Debug level on stdout
    #[must_use]
    pub const fn development() -> Self {
        Self {
            level: TracingLevel::Debug,
            output: TracingOutput::Stdout,
            filter: None,
        }
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        match &self.filter {
            Some(custom) => {
                EnvFilter::try_new(custom).map_err(|e| TracingError::InvalidFilter(e.to_string()))
            }
            None => Ok(EnvFilter::try_new(format!("{CRATE_TARGET}={}", self.level))
                .unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }
}

/// Installs a global subscriber; may be called once per process
///
/// # Errors
///
/// Returns an error if tracing was already initialized, the filter does not
/// parse, the log file cannot be created or another subscriber is installed.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let result = install(config);
    if result.is_err() {
        TRACING_INITIALIZED.store(false, Ordering::SeqCst);
        return result;
    }

    let _ = TRACING_CONFIG.set(config.clone());
    tracing::info!(level = %config.level, "Tracing initialized");
    Ok(())
}

fn install(config: &TracingConfig) -> TracingResult<()> {
    let filter = config.env_filter()?;
    match &config.output {
        TracingOutput::Stdout => install_with(filter, io::stdout, true),
        TracingOutput::Stderr => install_with(filter, io::stderr, true),
        TracingOutput::File(path) => {
            let file =
                File::create(path).map_err(|e| TracingError::FileCreationFailed(e.to_string()))?;
            install_with(filter, file, false)
        }
    }
}

fn install_with<W>(filter: EnvFilter, writer: W, ansi: bool) -> TracingResult<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))
}

/// Checks if tracing has been initialized
#[must_use]
pub fn is_tracing_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// The configuration passed to a successful [`init_tracing`]
#[must_use]
pub fn get_tracing_config() -> Option<&'static TracingConfig> {
    TRACING_CONFIG.get()
}

/// Creates an info span with engine field conventions
///
/// ```ignore
/// use rowkeeper_core::trace_operation;
///
/// let _span = trace_operation!("order.save", entry_count = entries.len()).entered();
/// ```
#[macro_export]
macro_rules! trace_operation {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Standard span names
pub mod span_names {
    /// Engine open: migrate, load and repair
    pub const ENGINE_OPEN: &str = "engine.open";
    /// Order load
    pub const ORDER_LOAD: &str = "order.load";
    /// Order save
    pub const ORDER_SAVE: &str = "order.save";
    /// Repair against the live item set
    pub const ORDER_REPAIR: &str = "order.repair";
    /// One-time legacy migration
    pub const ORDER_MIGRATE: &str = "order.migrate";
    /// Drag commit on pointer release
    pub const DRAG_COMMIT: &str = "drag.commit";
    /// Drag cancellation
    pub const DRAG_CANCEL: &str = "drag.cancel";
    /// External item change handling
    pub const ITEM_CHANGE: &str = "item.change";
}
