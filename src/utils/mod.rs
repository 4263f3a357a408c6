//! Utilities module for logging, errors, and helper functions
//!
//! This module provides:
//! - Structured logging with tracing
//! - Error handling types
//! - Filesystem and formatting helpers shared by the CLI entry points

pub mod error;
pub mod logging;

use std::path::Path;

use tracing::info;

// Re-export main types for convenience
pub use error::{ClassifierError, Result};
pub use logging::{init_logging, LogConfig};

/// Create `dir` (and parents) if it does not exist yet.
///
/// Returns `true` when the directory was created by this call.
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)?;
    info!("Directory {} created.", dir.display());
    Ok(true)
}

/// Format a duration in a human-readable way
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor();
        let secs = seconds % 60.0;
        format!("{}m {:.0}s", minutes as u32, secs)
    } else {
        let hours = (seconds / 3600.0).floor();
        let minutes = ((seconds % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours as u32, minutes as u32)
    }
}
