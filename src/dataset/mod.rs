//! Dataset module: image-folder splits, transforms and Burn batching
//!
//! Expected layout:
//!
//! ```text
//! data_dir/
//! ├── train/<class>/*.jpg
//! ├── valid/<class>/*.jpg
//! └── test/<class>/*.jpg   (optional)
//! ```

pub mod burn_dataset;
pub mod loader;
pub mod transforms;

#[cfg(test)]
pub(crate) mod testing;

pub use burn_dataset::{ImageBatch, ImageBatcher, ImageFolderDataset, ImageItem};
pub use loader::{DataSplits, ImageFolder, ImageSample};
pub use transforms::{process_image, ImageTransform, PreprocessConfig};

/// ImageNet per-channel mean (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Side of the square crop fed to the network
pub const DEFAULT_IMAGE_SIZE: usize = 224;

/// Shorter-side resize used before cropping at inference time
pub const INFERENCE_RESIZE: u32 = 256;

/// Shorter-side resize used before cropping for the training splits
pub const TRAIN_RESIZE: u32 = 255;

/// Image file extensions picked up by the loader
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];
