//! Error Handling Module
//!
//! Defines the error type shared by the dataset, model, checkpoint,
//! inference and scraping code. Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the image classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// A required dataset split directory does not exist
    #[error("Dataset folder not found: {0}")]
    DatasetNotFound(PathBuf),

    /// A split directory exists but contains no usable class folders or images
    #[error("Dataset at '{0}' is empty: {1}")]
    EmptyDataset(PathBuf, String),

    /// Category name file could not be read or parsed
    #[error("Category file '{path}' cannot be loaded: {reason}")]
    Categories { path: PathBuf, reason: String },

    /// Checkpoint could not be written or read back
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Model assembly error
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Page fetched but the expected element or attribute was missing
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// HTTP failure while fetching a page
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Serialization(err.to_string())
    }
}

impl From<burn::record::RecorderError> for ClassifierError {
    fn from(err: burn::record::RecorderError) -> Self {
        ClassifierError::Checkpoint(format!("{:?}", err))
    }
}

/// Convenience Result type for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;
