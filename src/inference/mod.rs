//! Inference module for single-image prediction
//!
//! This module provides:
//! - Loading a trained checkpoint into a [`Predictor`]
//! - Top-K prediction for one image
//! - Category-name lookup from a JSON file

pub mod categories;
pub mod predictor;

// Re-export main types for convenience
pub use categories::{load_names, CategoryMap};
pub use predictor::{PredictionResult, Predictor};

/// Default number of classes returned by `predict`
pub const DEFAULT_TOP_K: usize = 3;

/// Default category-name file
pub const DEFAULT_CATEGORY_NAMES: &str = "cat_to_name.json";
