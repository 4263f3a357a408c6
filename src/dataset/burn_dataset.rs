//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` trait over an [`ImageFolder`] split and a
//! `Batcher` that stacks preprocessed images into `[N, 3, H, W]` tensors.
//!
//! Images are loaded lazily, one `get` per sample, with the split's
//! transform applied on every access. Random transforms draw from a seeded
//! `ChaCha8Rng` held by the dataset.

use std::sync::Mutex;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use super::loader::{ImageFolder, ImageSample};
use super::transforms::{open_image, ImageTransform};

/// A single preprocessed image ready for batching
#[derive(Clone, Debug)]
pub struct ImageItem {
    /// Normalized CHW data [3 * H * W]
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
}

/// Lazily-loaded dataset over one split
pub struct ImageFolderDataset {
    samples: Vec<ImageSample>,
    transform: ImageTransform,
    rng: Mutex<ChaCha8Rng>,
}

impl std::fmt::Debug for ImageFolderDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFolderDataset")
            .field("samples", &self.samples.len())
            .field("transform", &self.transform)
            .finish()
    }
}

impl ImageFolderDataset {
    pub fn new(folder: &ImageFolder, transform: ImageTransform, seed: u64) -> Self {
        Self {
            samples: folder.samples.clone(),
            transform,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Training split: random rotation and flip
    pub fn training(folder: &ImageFolder, image_size: usize, seed: u64) -> Self {
        Self::new(folder, ImageTransform::training(image_size), seed)
    }

    /// Validation/test split: deterministic resize and crop
    pub fn evaluation(folder: &ImageFolder, image_size: usize) -> Self {
        Self::new(folder, ImageTransform::evaluation(image_size), 0)
    }
}

impl Dataset<ImageItem> for ImageFolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let sample = self.samples.get(index)?;

        let img = match open_image(&sample.path) {
            Ok(img) => img,
            Err(e) => {
                warn!("Skipping sample: {}", e);
                return None;
            }
        };

        let image = if self.transform.is_random() {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            self.transform.apply(&img, Some(&mut *rng))
        } else {
            self.transform.apply(&img, None)
        };

        Some(ImageItem {
            image,
            label: sample.label,
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images for training or evaluation
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    /// Batch of images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Batch of labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks [`ImageItem`]s into an [`ImageBatch`]
#[derive(Clone, Debug)]
pub struct ImageBatcher {
    image_size: usize,
}

impl ImageBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn make_folder(root: &std::path::Path) -> ImageFolder {
        for (class, shade) in [("1", 40u8), ("2", 200u8)] {
            let dir = root.join(class);
            std::fs::create_dir_all(&dir).unwrap();
            let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_pixel(20, 16, Rgb([shade, shade, shade]));
            img.save(dir.join("img.png")).unwrap();
        }
        ImageFolder::scan(root).unwrap()
    }

    #[test]
    fn test_dataset_get_and_len() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_folder(temp_dir.path());
        let dataset = ImageFolderDataset::evaluation(&folder, 8);

        assert_eq!(dataset.len(), 2);
        let item = dataset.get(1).unwrap();
        assert_eq!(item.label, 1);
        assert_eq!(item.image.len(), 3 * 8 * 8);
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_folder(temp_dir.path());
        std::fs::write(&folder.samples[0].path, b"not an image").unwrap();

        let dataset = ImageFolderDataset::training(&folder, 8, 7);
        assert!(dataset.get(0).is_none());
        assert!(dataset.get(1).is_some());
    }

    #[test]
    fn test_batcher_shapes() {
        let device = Default::default();
        let batcher = ImageBatcher::new(4);
        let items = vec![
            ImageItem { image: vec![0.5; 48], label: 0 },
            ImageItem { image: vec![-0.5; 48], label: 1 },
        ];

        let batch: ImageBatch<TestBackend> = batcher.batch(items, &device);
        assert_eq!(batch.images.dims(), [2, 3, 4, 4]);
        assert_eq!(batch.targets.dims(), [2]);
    }
}
