//! Training configuration
//!
//! Built once from the command line and written next to the checkpoint as
//! `training_config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_EVAL_BATCH_SIZE, DEFAULT_LEARNING_RATE,
    DEFAULT_PRINT_EVERY, DEFAULT_STEP_TRACK_EVERY,
};
use crate::dataset::DEFAULT_IMAGE_SIZE;
use crate::model::{Architecture, ModelConfig, DEFAULT_DROPOUT, DEFAULT_HIDDEN_UNITS};
use crate::utils::error::{ClassifierError, Result};

/// File name of the saved training configuration
pub const TRAINING_CONFIG_FILE: &str = "training_config.json";

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Dataset root containing `train/`, `valid/` and optionally `test/`
    pub data_dir: PathBuf,

    /// Directory for checkpoint, optimizer state and history
    pub save_dir: PathBuf,

    /// Backbone architecture
    pub arch: Architecture,

    /// SGD learning rate
    pub learning_rate: f64,

    /// Hidden units in the classifier head
    pub hidden_units: usize,

    /// Output classes; defaults to the number of train classes
    pub output_units: Option<usize>,

    /// Dropout rate in the classifier head
    pub dropout: f64,

    /// Number of training epochs
    pub epochs: usize,

    /// Batch size for training
    pub batch_size: usize,

    /// Batch size for validation and test
    pub eval_batch_size: usize,

    /// Run validation every N steps
    pub print_every: usize,

    /// Log step timing every N steps
    pub step_track_every: usize,

    /// Random seed for shuffling and augmentation
    pub seed: u64,

    /// Side of the square network input
    pub image_size: usize,

    /// Request the GPU backend
    pub gpu: bool,

    /// Burn record with pretrained backbone weights
    pub pretrained: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("flowers"),
            save_dir: PathBuf::from("checkpoints"),
            arch: Architecture::Vgg13,
            learning_rate: DEFAULT_LEARNING_RATE,
            hidden_units: DEFAULT_HIDDEN_UNITS,
            output_units: None,
            dropout: DEFAULT_DROPOUT,
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            eval_batch_size: DEFAULT_EVAL_BATCH_SIZE,
            print_every: DEFAULT_PRINT_EVERY,
            step_track_every: DEFAULT_STEP_TRACK_EVERY,
            seed: 42,
            image_size: DEFAULT_IMAGE_SIZE,
            gpu: false,
            pretrained: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("batch_size", self.batch_size),
            ("eval_batch_size", self.eval_batch_size),
            ("print_every", self.print_every),
            ("step_track_every", self.step_track_every),
            ("hidden_units", self.hidden_units),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ClassifierError::InvalidInput(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if !(self.learning_rate > 0.0) {
            return Err(ClassifierError::InvalidInput(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if self.image_size < self.arch.min_input_size() {
            return Err(ClassifierError::InvalidInput(format!(
                "image_size {} is too small for {} (minimum {})",
                self.image_size,
                self.arch,
                self.arch.min_input_size()
            )));
        }

        Ok(())
    }

    /// Model hyperparameters for a dataset with `num_classes` classes
    pub fn model_config(&self, num_classes: usize) -> Result<ModelConfig> {
        let output_units = match self.output_units {
            Some(units) if units < num_classes => {
                return Err(ClassifierError::InvalidInput(format!(
                    "output_units ({}) is smaller than the number of classes ({})",
                    units, num_classes
                )))
            }
            Some(units) => units,
            None => num_classes,
        };

        let config = ModelConfig::new(self.arch, output_units)
            .with_hidden_units(self.hidden_units)
            .with_dropout(self.dropout);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
