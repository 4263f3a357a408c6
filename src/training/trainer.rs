//! Training loop
//!
//! A custom loop over Burn primitives rather than the high-level learner:
//! forward, NLL loss, backward, SGD step on the classifier head.

use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer, SgdConfig},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{TrainingConfig, TRAINING_CONFIG_FILE};
use super::evaluate::{evaluate, nll_loss, EvalResult};
use crate::backend::resolve_device;
use crate::checkpoint::{save_checkpoint, CheckpointMeta};
use crate::dataset::{DataSplits, ImageBatch, ImageBatcher, ImageFolderDataset};
use crate::model::ImageClassifier;
use crate::utils::error::Result;
use crate::utils::logging::TrainingLogger;
use crate::utils::ensure_dir;

/// File name of the saved training history
pub const HISTORY_FILE: &str = "history.json";

/// One validation point of the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub epoch: usize,
    pub step: usize,
    /// Mean training loss over the steps since the previous point
    pub train_loss: f64,
    pub valid_loss: f64,
    pub valid_accuracy: f64,
}

/// Losses and accuracies collected during training
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub points: Vec<HistoryPoint>,
}

impl TrainingHistory {
    pub fn push(&mut self, point: HistoryPoint) {
        self.points.push(point);
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub checkpoint_path: PathBuf,
    pub history: TrainingHistory,
    pub class_names: Vec<String>,
    pub total_steps: usize,
    /// Evaluation of the test split, when present
    pub test: Option<EvalResult>,
    pub elapsed_secs: f64,
}

/// Train a classifier head on `config.data_dir` and checkpoint it to `config.save_dir`
///
/// # Type Parameters
/// * `B` - The autodiff backend to use (e.g., `Autodiff<NdArray>` or `Autodiff<Wgpu>`)
pub fn train<B: AutodiffBackend>(config: &TrainingConfig, device: &B::Device) -> Result<TrainingReport> {
    let start = Instant::now();
    config.validate()?;

    ensure_dir(&config.save_dir)?;

    println!("{}", "Loading Dataset...".cyan());
    let splits = DataSplits::load(&config.data_dir)?;
    let class_names = splits.class_names().to_vec();

    println!("{}", "Creating Model...".cyan());
    let model_config = config.model_config(class_names.len())?;
    let mut model = model_config.init_pretrained::<B>(config.pretrained.as_deref(), device)?;
    let mut optimizer = SgdConfig::new().init::<B, ImageClassifier<B>>();

    config.save(&config.save_dir.join(TRAINING_CONFIG_FILE))?;

    let meta = CheckpointMeta {
        arch: config.arch,
        epochs: config.epochs,
        hidden_units: model_config.hidden_units,
        output_units: model_config.output_units,
        dropout: model_config.dropout,
        image_size: config.image_size,
        data_dir: config.data_dir.display().to_string(),
        device: resolve_device(config.gpu).label().to_string(),
        save_dir: config.save_dir.display().to_string(),
        class_names: class_names.clone(),
        optimizer_algo: "SGD".to_string(),
        optimizer_state: String::new(),
        saved_at: String::new(),
    };
    save_checkpoint(&model, &optimizer, &meta, &config.save_dir)?;

    let train_dataset = ImageFolderDataset::training(&splits.train, config.image_size, config.seed);
    let valid_dataset = ImageFolderDataset::evaluation(&splits.valid, config.image_size);
    let batcher = ImageBatcher::new(config.image_size);

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Architecture:       {}", config.arch);
    println!("  Training samples:   {}", splits.train.samples.len());
    println!("  Validation samples: {}", splits.valid.samples.len());
    println!("  Classes:            {}", splits.train.num_classes());
    println!("  Epochs:             {}", config.epochs);
    println!("  Batch size:         {}", config.batch_size);
    println!("  Learning rate:      {}", config.learning_rate);
    println!();
    println!("{}", "Starting Training...".green().bold());

    let mut logger = TrainingLogger::new(config.epochs);
    let mut history = TrainingHistory::default();
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut steps = 0usize;
    let mut running_loss = 0.0f64;
    let mut running_steps = 0usize;

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<_> = chunk.iter().filter_map(|&i| train_dataset.get(i)).collect();
            if items.is_empty() {
                continue;
            }
            steps += 1;

            let batch: ImageBatch<B> = batcher.batch(items, device);
            let log_probs = model.forward(batch.images);
            let loss = nll_loss(log_probs, batch.targets);

            let loss_value: f64 = loss.clone().into_scalar().elem();
            running_loss += loss_value;
            running_steps += 1;
            debug!("Step {}: loss = {:.4}", steps, loss_value);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if steps % config.step_track_every == 0 {
                logger.track_step(steps);
            }

            if steps % config.print_every == 0 {
                let valid_start = Instant::now();
                let valid = evaluate(
                    &model.valid(),
                    &valid_dataset,
                    &batcher,
                    config.eval_batch_size,
                    device,
                );
                info!(
                    "Validation in epoch {} took {:.3} seconds",
                    epoch + 1,
                    valid_start.elapsed().as_secs_f64()
                );
                let point = HistoryPoint {
                    epoch: epoch + 1,
                    step: steps,
                    train_loss: running_loss / running_steps as f64,
                    valid_loss: valid.loss,
                    valid_accuracy: valid.accuracy,
                };
                println!(
                    "  Epoch: {}/{}.. Training Loss: {:.3}.. Valid Loss: {:.3}.. Valid Accuracy: {:.3}",
                    epoch + 1,
                    config.epochs,
                    point.train_loss,
                    point.valid_loss,
                    point.valid_accuracy
                );
                history.push(point);
                running_loss = 0.0;
                running_steps = 0;
            }
        }

        logger.end_epoch();
    }
    logger.log_complete();

    let checkpoint_path = save_checkpoint(&model, &optimizer, &meta, &config.save_dir)?;
    history.save(&config.save_dir.join(HISTORY_FILE))?;

    let test = match &splits.test {
        Some(test_split) => {
            let test_dataset = ImageFolderDataset::evaluation(test_split, config.image_size);
            let result = evaluate(
                &model.valid(),
                &test_dataset,
                &batcher,
                config.eval_batch_size,
                device,
            );
            info!(
                "Test Loss: {:.3}.. Test Accuracy: {:.3} ({} samples)",
                result.loss, result.accuracy, result.samples
            );
            Some(result)
        }
        None => None,
    };

    Ok(TrainingReport {
        checkpoint_path,
        history,
        class_names,
        total_steps: steps,
        test,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::load_checkpoint_meta;
    use crate::dataset::testing::make_dataset;
    use crate::model::Architecture;
    use burn::backend::{Autodiff, NdArray};
    use tempfile::TempDir;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn small_config(data_dir: &Path, save_dir: &Path) -> TrainingConfig {
        TrainingConfig {
            data_dir: data_dir.to_path_buf(),
            save_dir: save_dir.to_path_buf(),
            arch: Architecture::Alexnet,
            hidden_units: 8,
            epochs: 1,
            batch_size: 2,
            eval_batch_size: 2,
            print_every: 1,
            step_track_every: 1,
            image_size: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_train_one_epoch() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("flowers");
        let save_dir = temp_dir.path().join("checkpoints");
        make_dataset(&data_dir);

        let config = small_config(&data_dir, &save_dir);
        let device = Default::default();
        let report = train::<TestAutodiffBackend>(&config, &device).unwrap();

        assert_eq!(report.total_steps, 2);
        assert_eq!(report.history.points.len(), 2);
        assert_eq!(report.class_names, vec!["1", "2"]);
        assert_eq!(report.test.map(|t| t.samples), Some(4));
        assert!(report.history.last().unwrap().train_loss.is_finite());

        assert!(save_dir.join("checkpoint.mpk").is_file());
        assert!(save_dir.join("optimizer.mpk").is_file());
        assert!(save_dir.join(HISTORY_FILE).is_file());
        assert!(save_dir.join(TRAINING_CONFIG_FILE).is_file());

        let meta = load_checkpoint_meta::<TestBackend>(&report.checkpoint_path, &device).unwrap();
        assert_eq!(meta.arch, Architecture::Alexnet);
        assert_eq!(meta.epochs, 1);
        assert_eq!(meta.hidden_units, 8);
        assert_eq!(meta.output_units, 2);
        assert_eq!(meta.device, "cpu");
        assert_eq!(meta.optimizer_algo, "SGD");
    }

    #[test]
    fn test_validation_cadence() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("flowers");
        make_dataset(&data_dir);

        // 4 train images, batch 2: two steps per epoch, four in total
        let config = TrainingConfig {
            epochs: 2,
            print_every: 2,
            step_track_every: 3,
            ..small_config(&data_dir, &temp_dir.path().join("every_two"))
        };
        let device = Default::default();
        let report = train::<TestAutodiffBackend>(&config, &device).unwrap();
        assert_eq!(report.total_steps, 4);
        let steps: Vec<usize> = report.history.points.iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![2, 4]);
        assert_eq!(report.history.points[1].epoch, 2);

        let config = TrainingConfig {
            epochs: 2,
            print_every: 3,
            ..small_config(&data_dir, &temp_dir.path().join("every_three"))
        };
        let report = train::<TestAutodiffBackend>(&config, &device).unwrap();
        assert_eq!(report.history.points.len(), 1);
        assert_eq!(report.history.points[0].step, 3);
    }

    #[test]
    fn test_missing_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let config = small_config(&temp_dir.path().join("nope"), &temp_dir.path().join("out"));
        let device = Default::default();

        assert!(train::<TestAutodiffBackend>(&config, &device).is_err());
    }
}
