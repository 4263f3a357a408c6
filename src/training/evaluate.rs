//! Loss and accuracy on a held-out split

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

use crate::dataset::{ImageBatch, ImageBatcher, ImageFolderDataset};
use crate::model::ImageClassifier;

/// Result of one evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Mean negative log-likelihood per sample
    pub loss: f64,
    /// Fraction of correctly classified samples (0.0 - 1.0)
    pub accuracy: f64,
    pub samples: usize,
}

/// Negative log-likelihood of `targets` under `log_probs`, averaged over the batch
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [batch_size] = targets.dims();
    log_probs
        .gather(1, targets.reshape([batch_size, 1]))
        .mean()
        .neg()
}

/// Number of rows whose argmax equals the target
pub fn count_correct<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let [batch_size] = targets.dims();
    let predictions = log_probs.argmax(1).reshape([batch_size]);
    let correct: i64 = predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem();
    correct as usize
}

/// Evaluate the model on a dataset, in order, with the given batch size
pub fn evaluate<B: Backend>(
    model: &ImageClassifier<B>,
    dataset: &ImageFolderDataset,
    batcher: &ImageBatcher,
    batch_size: usize,
    device: &B::Device,
) -> EvalResult {
    let len = dataset.len();
    let mut loss_sum = 0.0f64;
    let mut correct = 0usize;
    let mut total = 0usize;

    for start in (0..len).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let n = items.len();
        let batch: ImageBatch<B> = batcher.batch(items, device);
        let log_probs = model.forward(batch.images);

        let loss: f64 = nll_loss(log_probs.clone(), batch.targets.clone())
            .into_scalar()
            .elem();
        loss_sum += loss * n as f64;
        correct += count_correct(log_probs, batch.targets);
        total += n;
    }

    if total == 0 {
        return EvalResult {
            loss: 0.0,
            accuracy: 0.0,
            samples: 0,
        };
    }

    EvalResult {
        loss: loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
        samples: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_nll_loss() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_floats(
            [[0.25f32.ln(), 0.75f32.ln()], [0.5f32.ln(), 0.5f32.ln()]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([1, 0], &device);

        let loss: f64 = nll_loss(log_probs, targets).into_scalar().elem();
        let expected = -(0.75f64.ln() + 0.5f64.ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_floats(
            [[-0.1, -2.0, -3.0], [-2.0, -0.1, -3.0], [-3.0, -2.0, -0.1]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 2, 2], &device);

        assert_eq!(count_correct(log_probs, targets), 2);
    }
}
