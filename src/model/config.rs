//! Model Configuration Module
//!
//! Hyperparameters that define the classifier. The config is passed alongside
//! the model and stored in checkpoints; it is never attached to the model.

use std::path::Path;

use burn::{config::Config, module::Module, tensor::backend::Backend};
use tracing::info;

use super::{Architecture, Backbone, ClassifierHead, ImageClassifier};
use crate::utils::error::{self, ClassifierError};

/// Configuration for an [`ImageClassifier`]
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Backbone architecture
    pub arch: Architecture,

    /// Hidden units in the classifier head
    #[config(default = 512)]
    pub hidden_units: usize,

    /// Number of output classes
    pub output_units: usize,

    /// Dropout rate between the two head layers
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl ModelConfig {
    /// Check the hyperparameters before building anything
    pub fn validate(&self) -> error::Result<()> {
        if self.hidden_units == 0 {
            return Err(ClassifierError::InvalidInput(
                "hidden_units must be greater than 0".to_string(),
            ));
        }
        if self.output_units == 0 {
            return Err(ClassifierError::InvalidInput(
                "output_units must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ClassifierError::InvalidInput(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Build the model around an existing backbone
    ///
    /// The backbone is frozen: its parameters no longer require gradients.
    pub fn init_with_backbone<B: Backend>(
        &self,
        backbone: Backbone<B>,
        device: &B::Device,
    ) -> ImageClassifier<B> {
        let head = ClassifierHead::new(
            self.arch.feature_dim(),
            self.hidden_units,
            self.output_units,
            self.dropout,
            device,
        );

        ImageClassifier {
            backbone: backbone.no_grad(),
            head,
        }
    }

    /// Build a model with a randomly initialized backbone
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<ImageClassifier<B>> {
        self.validate()?;
        Ok(self.init_with_backbone(Backbone::new(self.arch, device), device))
    }

    /// Build a model, loading backbone weights from `weights` when given
    pub fn init_pretrained<B: Backend>(
        &self,
        weights: Option<&Path>,
        device: &B::Device,
    ) -> error::Result<ImageClassifier<B>> {
        self.validate()?;
        let backbone = Backbone::pretrained(self.arch, weights, device)?;
        info!(
            "Built {} classifier: {} → {} → {} (dropout {})",
            self.arch,
            self.arch.feature_dim(),
            self.hidden_units,
            self.output_units,
            self.dropout
        );
        Ok(self.init_with_backbone(backbone, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Tensor;

    type TestBackend = NdArray;

    #[test]
    fn test_config_defaults() {
        let config = ModelConfig::new(Architecture::Vgg13, 102);
        assert_eq!(config.hidden_units, 512);
        assert_eq!(config.dropout, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ModelConfig::new(Architecture::Alexnet, 0);
        assert!(config.validate().is_err());

        let config = ModelConfig::new(Architecture::Alexnet, 2).with_dropout(1.0);
        assert!(matches!(config.validate(), Err(ClassifierError::InvalidInput(_))));
    }

    #[test]
    fn test_model_forward_shape() {
        let device = Default::default();
        let config = ModelConfig::new(Architecture::Alexnet, 4).with_hidden_units(16);
        let model = config.init::<TestBackend>(&device).unwrap();

        let output = model.forward(Tensor::zeros([2, 3, 64, 64], &device));
        assert_eq!(output.dims(), [2, 4]);
        assert_eq!(model.output_units(), 4);
        assert_eq!(model.hidden_units(), 16);
    }

    #[test]
    fn test_backbone_is_frozen() {
        let device = Default::default();
        let config = ModelConfig::new(Architecture::Alexnet, 3).with_hidden_units(8);
        let model = config.init::<Autodiff<TestBackend>>(&device).unwrap();

        let loss = model
            .forward(Tensor::ones([1, 3, 64, 64], &device))
            .mean();
        let grads = loss.backward();

        let Backbone::AlexNet(features) = &model.backbone else {
            panic!("expected AlexNet");
        };
        assert!(features.conv1.weight.grad(&grads).is_none());
        assert!(model.head.fc1.weight.grad(&grads).is_some());
    }
}
