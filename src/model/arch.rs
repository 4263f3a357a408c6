//! Supported backbone architectures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::ClassifierError;

/// Backbone architecture used as a frozen feature extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Alexnet,
    Vgg13,
    Vgg16,
}

impl Architecture {
    pub const ALL: [Architecture; 3] = [Architecture::Alexnet, Architecture::Vgg13, Architecture::Vgg16];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Alexnet => "alexnet",
            Architecture::Vgg13 => "vgg13",
            Architecture::Vgg16 => "vgg16",
        }
    }

    /// Channels of the last convolution
    pub fn out_channels(&self) -> usize {
        match self {
            Architecture::Alexnet => 256,
            Architecture::Vgg13 | Architecture::Vgg16 => 512,
        }
    }

    /// Side of the adaptive average pool output
    pub fn pooled_size(&self) -> usize {
        match self {
            Architecture::Alexnet => 6,
            Architecture::Vgg13 | Architecture::Vgg16 => 7,
        }
    }

    /// Smallest square input that survives every pooling stage
    pub fn min_input_size(&self) -> usize {
        match self {
            Architecture::Alexnet => 63,
            Architecture::Vgg13 | Architecture::Vgg16 => 32,
        }
    }

    /// Flattened feature size fed to the classifier head
    pub fn feature_dim(&self) -> usize {
        let side = self.pooled_size();
        self.out_channels() * side * side
    }

    /// Output channels of each convolution, grouped per max-pooled stage
    pub fn vgg_stages(&self) -> Option<&'static [&'static [usize]]> {
        match self {
            Architecture::Alexnet => None,
            Architecture::Vgg13 => Some(VGG13_STAGES),
            Architecture::Vgg16 => Some(VGG16_STAGES),
        }
    }
}

const VGG13_STAGES: &[&[usize]] = &[&[64, 64], &[128, 128], &[256, 256], &[512, 512], &[512, 512]];

const VGG16_STAGES: &[&[usize]] = &[
    &[64, 64],
    &[128, 128],
    &[256, 256, 256],
    &[512, 512, 512],
    &[512, 512, 512],
];

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.as_str() == name)
            .ok_or_else(|| {
                ClassifierError::Model(format!(
                    "unknown architecture '{}', expected one of alexnet, vgg13, vgg16",
                    s
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_dims() {
        assert_eq!(Architecture::Alexnet.feature_dim(), 9216);
        assert_eq!(Architecture::Vgg13.feature_dim(), 25088);
        assert_eq!(Architecture::Vgg16.feature_dim(), 25088);
    }

    #[test]
    fn test_parse_round_trip() {
        for arch in Architecture::ALL {
            assert_eq!(arch.to_string().parse::<Architecture>().unwrap(), arch);
        }
        assert_eq!("VGG16".parse::<Architecture>().unwrap(), Architecture::Vgg16);
        assert!("resnet".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_vgg_depths() {
        let count = |arch: Architecture| -> usize {
            arch.vgg_stages().unwrap().iter().map(|s| s.len()).sum()
        };
        assert_eq!(count(Architecture::Vgg13), 10);
        assert_eq!(count(Architecture::Vgg16), 13);
        assert!(Architecture::Alexnet.vgg_stages().is_none());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Architecture::Vgg13).unwrap();
        assert_eq!(json, "\"vgg13\"");
    }
}
