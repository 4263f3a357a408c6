//! Image Classifier - Transfer Learning with Burn
//!
//! Trains a small classifier head on top of a frozen AlexNet or VGG feature
//! extractor, checkpoints the result, and predicts the top-K classes of a
//! single image.
//!
//! ## Modules
//!
//! - `backend`: CPU/GPU backend selection
//! - `cli`: command line arguments for `train` and `predict`
//! - `dataset`: image-folder splits, transforms and batching
//! - `model`: backbones, classifier head and model configuration
//! - `training`: training loop, evaluation and history
//! - `checkpoint`: saving and restoring trained models
//! - `inference`: single-image prediction and category names
//! - `scrape`: the small HTML attribute scraper
//! - `utils`: errors, logging and helpers

pub mod backend;
pub mod checkpoint;
pub mod cli;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod scrape;
pub mod training;
pub mod utils;

pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointMeta};
pub use dataset::DataSplits;
pub use inference::{CategoryMap, PredictionResult, Predictor};
pub use model::{Architecture, ImageClassifier, ModelConfig};
pub use training::{train, TrainingConfig, TrainingReport};
pub use utils::error::{ClassifierError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
