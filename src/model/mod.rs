//! Model module for transfer-learning classifiers using the Burn framework
//!
//! This module provides:
//! - AlexNet and VGG13/VGG16 convolutional feature extractors
//! - A trainable two-layer classifier head
//! - Model configuration and construction
//!
//! ## Architecture
//!
//! ```text
//! image [N, 3, H, W]
//!   → frozen backbone (conv stack + adaptive average pool)
//!   → flatten
//!   → Linear(feature_dim, hidden) → ReLU → Dropout → Linear(hidden, classes)
//!   → log-softmax
//! ```

pub mod arch;
pub mod backbone;
pub mod classifier;
pub mod config;

// Re-export main types for convenience
pub use arch::Architecture;
pub use backbone::Backbone;
pub use classifier::{ClassifierHead, ImageClassifier, ImageClassifierRecord};
pub use config::ModelConfig;

/// Default dropout rate for the classifier head
pub const DEFAULT_DROPOUT: f64 = 0.5;

/// Default number of hidden units in the classifier head
pub const DEFAULT_HIDDEN_UNITS: usize = 512;
