//! Model checkpointing
//!
//! A checkpoint is one Burn record file holding the model hyperparameters,
//! the class-folder names, bookkeeping metadata and the full model record.
//! The optimizer state goes to a second record file next to it.
//!
//! ```text
//! save_dir/
//! ├── checkpoint.mpk   (CheckpointRecord)
//! └── optimizer.mpk    (optimizer record)
//! ```

use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    optim::Optimizer,
    record::{CompactRecorder, Record, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Architecture, ImageClassifier, ImageClassifierRecord, ModelConfig};
use crate::utils::error::{ClassifierError, Result};

/// File stem of the model checkpoint
pub const CHECKPOINT_FILE: &str = "checkpoint";

/// File stem of the optimizer state
pub const OPTIMIZER_FILE: &str = "optimizer";

/// Extension written by [`CompactRecorder`]
pub const RECORD_EXTENSION: &str = "mpk";

/// On-disk checkpoint layout
#[derive(Record)]
pub struct CheckpointRecord<B: Backend> {
    pub arch: String,
    pub epochs: usize,
    pub hidden_units: usize,
    pub output_units: usize,
    pub dropout: f64,
    pub image_size: usize,
    pub data_dir: String,
    pub device: String,
    pub save_dir: String,
    pub class_names: Vec<String>,
    pub optimizer_algo: String,
    pub optimizer_state: String,
    pub saved_at: String,
    pub state_dict: ImageClassifierRecord<B>,
}

/// Everything in a checkpoint except the weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub arch: Architecture,
    pub epochs: usize,
    pub hidden_units: usize,
    pub output_units: usize,
    pub dropout: f64,
    /// Side of the square network input used in training
    pub image_size: usize,
    pub data_dir: String,
    pub device: String,
    pub save_dir: String,
    /// Class-folder names, index = model output
    pub class_names: Vec<String>,
    pub optimizer_algo: String,
    /// File name of the optimizer record, relative to `save_dir`
    pub optimizer_state: String,
    /// RFC 3339 timestamp of the last save
    pub saved_at: String,
}

impl CheckpointMeta {
    /// Hyperparameters needed to rebuild the model
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(self.arch, self.output_units)
            .with_hidden_units(self.hidden_units)
            .with_dropout(self.dropout)
    }

    fn into_record<B: Backend>(self, state_dict: ImageClassifierRecord<B>) -> CheckpointRecord<B> {
        CheckpointRecord {
            arch: self.arch.to_string(),
            epochs: self.epochs,
            hidden_units: self.hidden_units,
            output_units: self.output_units,
            dropout: self.dropout,
            image_size: self.image_size,
            data_dir: self.data_dir,
            device: self.device,
            save_dir: self.save_dir,
            class_names: self.class_names,
            optimizer_algo: self.optimizer_algo,
            optimizer_state: self.optimizer_state,
            saved_at: self.saved_at,
            state_dict,
        }
    }

    fn from_record<B: Backend>(
        record: CheckpointRecord<B>,
    ) -> Result<(Self, ImageClassifierRecord<B>)> {
        let meta = Self {
            arch: record.arch.parse()?,
            epochs: record.epochs,
            hidden_units: record.hidden_units,
            output_units: record.output_units,
            dropout: record.dropout,
            image_size: record.image_size,
            data_dir: record.data_dir,
            device: record.device,
            save_dir: record.save_dir,
            class_names: record.class_names,
            optimizer_algo: record.optimizer_algo,
            optimizer_state: record.optimizer_state,
            saved_at: record.saved_at,
        };
        Ok((meta, record.state_dict))
    }
}

/// Resolve a user-supplied checkpoint location to the record file
///
/// Accepts the record file itself, its path without extension, or the
/// save directory that contains it.
pub fn checkpoint_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CHECKPOINT_FILE).with_extension(RECORD_EXTENSION)
    } else {
        path.with_extension(RECORD_EXTENSION)
    }
}

/// Save model, metadata and optimizer state into `save_dir`
///
/// Overwrites any previous checkpoint there. Returns the checkpoint path.
pub fn save_checkpoint<B, O>(
    model: &ImageClassifier<B>,
    optimizer: &O,
    meta: &CheckpointMeta,
    save_dir: &Path,
) -> Result<PathBuf>
where
    B: AutodiffBackend,
    O: Optimizer<ImageClassifier<B>, B>,
{
    let recorder = CompactRecorder::new();

    let mut meta = meta.clone();
    meta.saved_at = chrono::Utc::now().to_rfc3339();
    meta.optimizer_state = format!("{}.{}", OPTIMIZER_FILE, RECORD_EXTENSION);

    let optimizer_path = save_dir.join(OPTIMIZER_FILE);
    Recorder::<B>::record(&recorder, optimizer.to_record(), optimizer_path)?;

    let checkpoint_path = save_dir.join(CHECKPOINT_FILE);
    let record = meta.into_record(model.clone().into_record());
    Recorder::<B>::record(&recorder, record, checkpoint_path.clone())?;

    let checkpoint_path = checkpoint_path.with_extension(RECORD_EXTENSION);
    info!("Checkpoint saved to {:?}", checkpoint_path);
    Ok(checkpoint_path)
}

/// Read only the metadata of a checkpoint
pub fn load_checkpoint_meta<B: Backend>(path: &Path, device: &B::Device) -> Result<CheckpointMeta> {
    let (meta, _) = read_record::<B>(path, device)?;
    Ok(meta)
}

/// Rebuild the trained model from a checkpoint
pub fn load_checkpoint<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(ImageClassifier<B>, CheckpointMeta)> {
    let (meta, state_dict) = read_record::<B>(path, device)?;

    let model = meta.model_config().init::<B>(device)?.load_record(state_dict);
    info!(
        "Loaded {} model ({} hidden units, {} classes)",
        meta.arch, meta.hidden_units, meta.output_units
    );

    Ok((model, meta))
}

fn read_record<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(CheckpointMeta, ImageClassifierRecord<B>)> {
    let file = checkpoint_file(path);
    if !file.is_file() {
        return Err(ClassifierError::Checkpoint(format!(
            "checkpoint not found at {:?}",
            file
        )));
    }

    let record: CheckpointRecord<B> =
        Recorder::<B>::load(&CompactRecorder::new(), file.clone(), device)?;
    info!("Checkpoint loaded from {:?}", file);

    CheckpointMeta::from_record(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::SgdConfig;
    use burn::tensor::Tensor;
    use tempfile::TempDir;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn sample_meta(save_dir: &Path) -> CheckpointMeta {
        CheckpointMeta {
            arch: Architecture::Alexnet,
            epochs: 1,
            hidden_units: 16,
            output_units: 2,
            dropout: 0.5,
            image_size: 64,
            data_dir: "flowers".to_string(),
            device: "cpu".to_string(),
            save_dir: save_dir.display().to_string(),
            class_names: vec!["1".to_string(), "2".to_string()],
            optimizer_algo: "SGD".to_string(),
            optimizer_state: String::new(),
            saved_at: String::new(),
        }
    }

    #[test]
    fn test_save_and_load_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let device = Default::default();
        let meta = sample_meta(temp_dir.path());

        let model = meta
            .model_config()
            .init::<TestAutodiffBackend>(&device)
            .unwrap();
        let optimizer = SgdConfig::new().init::<TestAutodiffBackend, ImageClassifier<TestAutodiffBackend>>();

        let path = save_checkpoint(&model, &optimizer, &meta, temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join("checkpoint.mpk"));
        assert!(temp_dir.path().join("optimizer.mpk").is_file());

        let (loaded, loaded_meta) = load_checkpoint::<TestBackend>(&path, &device).unwrap();
        assert_eq!(loaded_meta.arch, Architecture::Alexnet);
        assert_eq!(loaded_meta.hidden_units, 16);
        assert_eq!(loaded_meta.output_units, 2);
        assert_eq!(loaded_meta.class_names, meta.class_names);
        assert_eq!(loaded_meta.optimizer_algo, "SGD");
        assert_eq!(loaded_meta.optimizer_state, "optimizer.mpk");
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded_meta.saved_at).is_ok());

        assert_eq!(loaded.output_units(), 2);
        assert_eq!(loaded.hidden_units(), 16);
        let output = loaded.forward(Tensor::zeros([1, 3, 64, 64], &device));
        assert_eq!(output.dims(), [1, 2]);
    }

    #[test]
    fn test_load_from_save_dir() {
        let temp_dir = TempDir::new().unwrap();
        let device = Default::default();
        let meta = sample_meta(temp_dir.path());

        let model = meta
            .model_config()
            .init::<TestAutodiffBackend>(&device)
            .unwrap();
        let optimizer = SgdConfig::new().init::<TestAutodiffBackend, ImageClassifier<TestAutodiffBackend>>();
        save_checkpoint(&model, &optimizer, &meta, temp_dir.path()).unwrap();

        let loaded = load_checkpoint_meta::<TestBackend>(temp_dir.path(), &device).unwrap();
        assert_eq!(loaded.epochs, 1);
        assert_eq!(loaded.data_dir, "flowers");
    }

    #[test]
    fn test_missing_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let device = Default::default();

        let result = load_checkpoint::<TestBackend>(&temp_dir.path().join("nothing.mpk"), &device);
        assert!(matches!(result, Err(ClassifierError::Checkpoint(_))));
    }

    #[test]
    fn test_checkpoint_file_resolution() {
        assert_eq!(
            checkpoint_file(Path::new("out/checkpoint")),
            PathBuf::from("out/checkpoint.mpk")
        );
        assert_eq!(
            checkpoint_file(Path::new("out/checkpoint.mpk")),
            PathBuf::from("out/checkpoint.mpk")
        );
    }
}
