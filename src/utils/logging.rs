//! Logging Module
//!
//! Structured logging with the `tracing` crate, plus a small timing logger
//! used by the training loop for step, epoch and total durations.

use std::time::Instant;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use super::format_duration;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to include thread IDs
    pub include_thread_ids: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
            include_thread_ids: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            include_thread_ids: true,
            ansi_colors: true,
        }
    }

    /// Create a quiet logging config (errors only)
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            include_target: false,
            include_thread_ids: false,
            ansi_colors: true,
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Initialize logging with the given configuration
///
/// `RUST_LOG` overrides the configured level when set.
/// Returns an error message if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let default_level = LevelFilter::from_level(config.level.to_tracing_level());
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_ids)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Timing logger for the training loop
pub struct TrainingLogger {
    total_epochs: usize,
    epoch: usize,
    training_start: Instant,
    epoch_start: Instant,
    step_start: Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        let now = Instant::now();
        Self {
            total_epochs,
            epoch: 0,
            training_start: now,
            epoch_start: now,
            step_start: now,
        }
    }

    /// Log start of an epoch and reset the epoch/step clocks
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();
        self.step_start = self.epoch_start;

        tracing::info!("Starting epoch {}/{}", epoch + 1, self.total_epochs);
    }

    /// Log the time spent since the previous tracked step
    pub fn track_step(&mut self, step: usize) {
        tracing::info!(
            "Time in step #{}: {:.3} seconds",
            step,
            self.step_start.elapsed().as_secs_f64()
        );
        self.step_start = Instant::now();
    }

    pub fn end_epoch(&self) {
        tracing::info!(
            "Epoch {}/{} took {}",
            self.epoch + 1,
            self.total_epochs,
            format_duration(self.epoch_start.elapsed().as_secs_f64())
        );
    }

    pub fn log_complete(&self) {
        tracing::info!(
            "Total training time: {}",
            format_duration(self.training_start.elapsed().as_secs_f64())
        );
    }
}
