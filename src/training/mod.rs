//! Training module
//!
//! This module provides:
//! - The training loop (frozen backbone, SGD on the classifier head)
//! - Evaluation of loss and accuracy on a held-out split
//! - Training configuration and history
//!
//! ## Loop
//!
//! 1. Save an initial checkpoint
//! 2. For each epoch, shuffle the train split and step through it in batches
//! 3. Every `step_track_every` steps, log the time since the last tracking point
//! 4. Every `print_every` steps, run a full validation pass and log it
//! 5. Save the final checkpoint, the history, and evaluate the test split

pub mod config;
pub mod evaluate;
pub mod trainer;

// Re-export main types for convenience
pub use config::TrainingConfig;
pub use evaluate::{evaluate, nll_loss, EvalResult};
pub use trainer::{train, HistoryPoint, TrainingHistory, TrainingReport};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 20;

/// Default batch size for the train split
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default batch size for the valid and test splits
pub const DEFAULT_EVAL_BATCH_SIZE: usize = 32;

/// Default SGD learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Default number of steps between validation passes
pub const DEFAULT_PRINT_EVERY: usize = 60;

/// Default number of steps between timing logs
pub const DEFAULT_STEP_TRACK_EVERY: usize = 30;
