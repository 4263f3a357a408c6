//! Single-image prediction with a trained checkpoint

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::categories::CategoryMap;
use crate::checkpoint::{load_checkpoint, CheckpointMeta};
use crate::dataset::process_image;
use crate::model::ImageClassifier;
use crate::utils::error::{ClassifierError, Result};

/// Top-K result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Path to the input image
    pub image_path: PathBuf,

    /// Probabilities of the top-K classes, highest first
    pub probabilities: Vec<f32>,

    /// Class keys (class-folder names) of the top-K classes
    pub classes: Vec<String>,

    /// Display names of the top-K classes
    pub names: Vec<String>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl PredictionResult {
    /// Pick the `top_k` most probable classes from a full distribution
    ///
    /// Fails when `top_k` is outside `1..=probabilities.len()`, when a picked
    /// output has no class folder, or when a class has no category name.
    pub fn from_probabilities(
        image_path: &Path,
        probabilities: &[f32],
        top_k: usize,
        class_names: &[String],
        categories: &CategoryMap,
        inference_time: Duration,
    ) -> Result<Self> {
        check_top_k(top_k, probabilities.len())?;

        let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(top_k);

        let classes = indexed
            .iter()
            .map(|&(idx, _)| {
                class_names.get(idx).cloned().ok_or_else(|| {
                    ClassifierError::InvalidInput(format!(
                        "model output {} has no class folder ({} classes)",
                        idx,
                        class_names.len()
                    ))
                })
            })
            .collect::<Result<Vec<String>>>()?;
        let names = classes
            .iter()
            .map(|key| categories.name_for(key).map(str::to_string))
            .collect::<Result<Vec<String>>>()?;

        Ok(Self {
            image_path: image_path.to_path_buf(),
            probabilities: indexed.iter().map(|&(_, p)| p).collect(),
            classes,
            names,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }

    /// Most probable class name
    pub fn top_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Pretty print the prediction result
    pub fn display(&self) -> String {
        let mut output = format!("Image: {:?}\n", self.image_path);
        output.push_str(&format!("Inference time: {:.2} ms\n", self.inference_time_ms));
        output.push_str(&format!("\nTop-{} predictions:\n", self.probabilities.len()));
        for (i, ((name, class), prob)) in self
            .names
            .iter()
            .zip(&self.classes)
            .zip(&self.probabilities)
            .enumerate()
        {
            output.push_str(&format!(
                "  {}. {} (class {}) - {:.2}%\n",
                i + 1,
                name,
                class,
                prob * 100.0
            ));
        }
        output
    }
}

fn check_top_k(top_k: usize, outputs: usize) -> Result<()> {
    if top_k == 0 || top_k > outputs {
        return Err(ClassifierError::InvalidInput(format!(
            "top_k must be between 1 and {}, got {}",
            outputs, top_k
        )));
    }
    Ok(())
}

/// A trained model ready for inference
pub struct Predictor<B: Backend> {
    model: ImageClassifier<B>,
    meta: CheckpointMeta,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Load the model from a checkpoint file or save directory
    pub fn load(checkpoint_path: &Path, device: &B::Device) -> Result<Self> {
        let (model, meta) = load_checkpoint::<B>(checkpoint_path, device)?;
        Ok(Self {
            model,
            meta,
            device: device.clone(),
        })
    }

    pub fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }

    /// Full probability distribution over the model outputs
    pub fn probabilities(&self, image_path: &Path) -> Result<Vec<f32>> {
        let size = self.meta.image_size;
        let data = process_image(image_path, size)?;
        let input = Tensor::<B, 4>::from_floats(TensorData::new(data, [1, 3, size, size]), &self.device);

        self.model
            .forward_probabilities(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Model(format!("cannot read model output: {:?}", e)))
    }

    /// Predict the `top_k` most probable classes of one image
    pub fn predict(
        &self,
        image_path: &Path,
        top_k: usize,
        categories: &CategoryMap,
    ) -> Result<PredictionResult> {
        check_top_k(top_k, self.meta.output_units)?;

        let start = Instant::now();
        let probabilities = self.probabilities(image_path)?;
        let elapsed = start.elapsed();
        debug!("Forward pass took {:?}", elapsed);

        PredictionResult::from_probabilities(
            image_path,
            &probabilities,
            top_k,
            &self.meta.class_names,
            categories,
            elapsed,
        )
    }
}
