//! Convolutional feature extractors
//!
//! Layer layout follows the torchvision AlexNet and VGG definitions so that
//! converted ImageNet weights line up parameter for parameter.

use std::path::Path;

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        PaddingConfig2d, Relu,
    },
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor},
};
use tracing::{info, warn};

use super::Architecture;
use crate::utils::error::{ClassifierError, Result};

fn conv<B: Backend>(
    channels: [usize; 2],
    kernel_size: usize,
    stride: usize,
    padding: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new(channels, [kernel_size, kernel_size])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .init(device)
}

/// AlexNet convolutional features
///
/// Output: `[N, 256, 6, 6]`
#[derive(Module, Debug)]
pub struct AlexNetFeatures<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub conv5: Conv2d<B>,
    pool: MaxPool2d,
    relu: Relu,
    avgpool: AdaptiveAvgPool2d,
}

impl<B: Backend> AlexNetFeatures<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            conv1: conv([3, 64], 11, 4, 2, device),
            conv2: conv([64, 192], 5, 1, 2, device),
            conv3: conv([192, 384], 3, 1, 1, device),
            conv4: conv([384, 256], 3, 1, 1, device),
            conv5: conv([256, 256], 3, 1, 1, device),
            pool: MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init(),
            relu: Relu::new(),
            avgpool: AdaptiveAvgPool2dConfig::new([6, 6]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.pool.forward(self.relu.forward(self.conv1.forward(x)));
        let x = self.pool.forward(self.relu.forward(self.conv2.forward(x)));
        let x = self.relu.forward(self.conv3.forward(x));
        let x = self.relu.forward(self.conv4.forward(x));
        let x = self.pool.forward(self.relu.forward(self.conv5.forward(x)));
        self.avgpool.forward(x)
    }
}

/// A run of 3×3 convolutions followed by a 2×2 max pool
#[derive(Module, Debug)]
pub struct VggStage<B: Backend> {
    pub convs: Vec<Conv2d<B>>,
}

impl<B: Backend> VggStage<B> {
    pub fn new(in_channels: usize, widths: &[usize], device: &B::Device) -> Self {
        let mut channels = in_channels;
        let convs = widths
            .iter()
            .map(|&width| {
                let layer = conv([channels, width], 3, 1, 1, device);
                channels = width;
                layer
            })
            .collect();
        Self { convs }
    }

    pub fn forward(&self, x: Tensor<B, 4>, relu: &Relu, pool: &MaxPool2d) -> Tensor<B, 4> {
        let x = self
            .convs
            .iter()
            .fold(x, |x, layer| relu.forward(layer.forward(x)));
        pool.forward(x)
    }
}

/// VGG convolutional features (13 or 16 layer variant)
///
/// Output: `[N, 512, 7, 7]`
#[derive(Module, Debug)]
pub struct VggFeatures<B: Backend> {
    pub stages: Vec<VggStage<B>>,
    pool: MaxPool2d,
    relu: Relu,
    avgpool: AdaptiveAvgPool2d,
}

impl<B: Backend> VggFeatures<B> {
    pub fn new(stages: &[&[usize]], device: &B::Device) -> Self {
        let mut in_channels = 3;
        let stages = stages
            .iter()
            .map(|widths| {
                let stage = VggStage::new(in_channels, widths, device);
                in_channels = widths.last().copied().unwrap_or(in_channels);
                stage
            })
            .collect();

        Self {
            stages,
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            relu: Relu::new(),
            avgpool: AdaptiveAvgPool2dConfig::new([7, 7]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self
            .stages
            .iter()
            .fold(x, |x, stage| stage.forward(x, &self.relu, &self.pool));
        self.avgpool.forward(x)
    }

    pub fn num_convs(&self) -> usize {
        self.stages.iter().map(|s| s.convs.len()).sum()
    }
}

/// Feature extractor for one of the supported architectures
#[derive(Module, Debug)]
pub enum Backbone<B: Backend> {
    AlexNet(AlexNetFeatures<B>),
    Vgg(VggFeatures<B>),
}

impl<B: Backend> Backbone<B> {
    /// Build the requested architecture with randomly initialized weights
    pub fn new(arch: Architecture, device: &B::Device) -> Self {
        match arch.vgg_stages() {
            Some(stages) => Backbone::Vgg(VggFeatures::new(stages, device)),
            None => Backbone::AlexNet(AlexNetFeatures::new(device)),
        }
    }

    /// Build the architecture and, when given, load pretrained weights from a Burn record
    pub fn pretrained(arch: Architecture, weights: Option<&Path>, device: &B::Device) -> Result<Self> {
        let backbone = Self::new(arch, device);
        match weights {
            Some(path) => {
                info!("Loading pretrained {} weights from {:?}", arch, path);
                backbone
                    .load_file(path.to_path_buf(), &CompactRecorder::new(), device)
                    .map_err(|e| {
                        ClassifierError::Model(format!(
                            "failed to load {} weights from {:?}: {:?}",
                            arch, path, e
                        ))
                    })
            }
            None => {
                warn!("No pretrained weights given, {} backbone starts from random init", arch);
                Ok(backbone)
            }
        }
    }

    /// Forward pass, flattened to `[N, feature_dim]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = match self {
            Backbone::AlexNet(net) => net.forward(x),
            Backbone::Vgg(net) => net.forward(x),
        };
        features.flatten(1, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_alexnet_feature_shape() {
        let device = Default::default();
        let backbone = Backbone::<TestBackend>::new(Architecture::Alexnet, &device);
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &device);

        let features = backbone.forward(input);
        assert_eq!(features.dims(), [1, Architecture::Alexnet.feature_dim()]);
    }

    #[test]
    fn test_vgg13_feature_shape() {
        let device = Default::default();
        let backbone = Backbone::<TestBackend>::new(Architecture::Vgg13, &device);
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);

        let features = backbone.forward(input);
        assert_eq!(features.dims(), [1, 25088]);
    }

    #[test]
    fn test_vgg16_layer_count() {
        let device = Default::default();
        match Backbone::<TestBackend>::new(Architecture::Vgg16, &device) {
            Backbone::Vgg(net) => assert_eq!(net.num_convs(), 13),
            Backbone::AlexNet(_) => panic!("expected a VGG backbone"),
        }
    }

    #[test]
    fn test_pretrained_weights_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alexnet_features");
        let device = Default::default();

        let original = Backbone::<TestBackend>::new(Architecture::Alexnet, &device);
        original
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .unwrap();

        let loaded =
            Backbone::<TestBackend>::pretrained(Architecture::Alexnet, Some(&path), &device).unwrap();
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        let a = original.forward(input.clone()).into_data().to_vec::<f32>().unwrap();
        let b = loaded.forward(input).into_data().to_vec::<f32>().unwrap();

        // Half-precision storage
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-1 * (1.0 + x.abs()));
        }
    }

    #[test]
    fn test_pretrained_missing_file() {
        let device = Default::default();
        let result = Backbone::<TestBackend>::pretrained(
            Architecture::Alexnet,
            Some(Path::new("no/such/weights")),
            &device,
        );
        assert!(matches!(result, Err(ClassifierError::Model(_))));
    }
}
