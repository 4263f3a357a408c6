//! Image Transforms
//!
//! Resize, center crop, random rotation / flip and ImageNet normalization.
//!
//! # Pipelines
//!
//! - **Training**: random rotation (±20°), resize shorter side to 255,
//!   center crop, random horizontal flip
//! - **Validation/Test**: resize shorter side to 255, center crop
//! - **Inference**: resize shorter side to 256, center crop
//!
//! All pipelines end with a CHW float vector normalized with ImageNet stats.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgb, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{DEFAULT_IMAGE_SIZE, IMAGENET_MEAN, IMAGENET_STD, INFERENCE_RESIZE, TRAIN_RESIZE};
use crate::utils::error::{ClassifierError, Result};

/// Sizes used by a preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Shorter side after resizing
    pub resize: u32,
    /// Side of the square center crop
    pub crop: u32,
}

impl PreprocessConfig {
    /// Inference sizes: 256 → 224, scaled proportionally for other crop sizes
    pub fn inference(image_size: usize) -> Self {
        Self {
            resize: scaled_resize(INFERENCE_RESIZE, image_size),
            crop: image_size as u32,
        }
    }

    /// Training/validation sizes: 255 → 224, scaled proportionally
    pub fn training(image_size: usize) -> Self {
        Self {
            resize: scaled_resize(TRAIN_RESIZE, image_size),
            crop: image_size as u32,
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::inference(DEFAULT_IMAGE_SIZE)
    }
}

fn scaled_resize(resize_at_default: u32, image_size: usize) -> u32 {
    (resize_at_default as usize * image_size / DEFAULT_IMAGE_SIZE) as u32
}

/// Resize so the shorter side equals `target`, keeping the aspect ratio
///
/// The longer side is truncated, not rounded.
pub fn resize_shorter_side(img: &DynamicImage, target: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_w, new_h) = if width <= height {
        let h = (target as u64 * height as u64 / width.max(1) as u64) as u32;
        (target, h.max(1))
    } else {
        let w = (target as u64 * width as u64 / height.max(1) as u64) as u32;
        (w.max(1), target)
    };
    img.resize_exact(new_w, new_h, FilterType::Triangle)
}

/// Crop a `size`×`size` square around the image center
///
/// Images smaller than `size` are padded with black.
pub fn center_crop(img: &DynamicImage, size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let left = (width as i64 - size as i64).div_euclid(2);
    let top = (height as i64 - size as i64).div_euclid(2);

    if left >= 0 && top >= 0 {
        return img.crop_imm(left as u32, top as u32, size, size);
    }

    let rgb = img.to_rgb8();
    let mut output: RgbImage = ImageBuffer::from_pixel(size, size, Rgb([0, 0, 0]));
    for y in 0..size {
        for x in 0..size {
            let src_x = left + x as i64;
            let src_y = top + y as i64;
            if src_x >= 0 && src_y >= 0 && src_x < width as i64 && src_y < height as i64 {
                output.put_pixel(x, y, *rgb.get_pixel(src_x as u32, src_y as u32));
            }
        }
    }
    DynamicImage::ImageRgb8(output)
}

/// Convert to a CHW float vector normalized with ImageNet mean/std
pub fn to_normalized_chw(img: &DynamicImage) -> Vec<f32> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = Vec::with_capacity(3 * height as usize * width as usize);

    for c in 0..3 {
        for y in 0..height {
            for x in 0..width {
                let value = rgb.get_pixel(x, y)[c] as f32 / 255.0;
                data.push((value - IMAGENET_MEAN[c]) / IMAGENET_STD[c]);
            }
        }
    }

    data
}

/// A resize/crop pipeline with optional random rotation and flip
#[derive(Debug, Clone)]
pub struct ImageTransform {
    pub sizes: PreprocessConfig,
    /// Maximum rotation angle in degrees (applies ±rotation_degrees)
    pub rotation_degrees: f32,
    /// Probability of a horizontal flip
    pub horizontal_flip_prob: f32,
}

impl ImageTransform {
    /// Augmenting pipeline for the train split
    pub fn training(image_size: usize) -> Self {
        Self {
            sizes: PreprocessConfig::training(image_size),
            rotation_degrees: 20.0,
            horizontal_flip_prob: 0.5,
        }
    }

    /// Deterministic pipeline for the valid/test splits
    pub fn evaluation(image_size: usize) -> Self {
        Self {
            sizes: PreprocessConfig::training(image_size),
            rotation_degrees: 0.0,
            horizontal_flip_prob: 0.0,
        }
    }

    /// Deterministic pipeline for single-image prediction
    pub fn inference(image_size: usize) -> Self {
        Self {
            sizes: PreprocessConfig::inference(image_size),
            rotation_degrees: 0.0,
            horizontal_flip_prob: 0.0,
        }
    }

    pub fn is_random(&self) -> bool {
        self.rotation_degrees > 0.0 || self.horizontal_flip_prob > 0.0
    }

    /// Run the pipeline; random steps are skipped when `rng` is `None`
    pub fn apply(&self, img: &DynamicImage, rng: Option<&mut ChaCha8Rng>) -> Vec<f32> {
        let mut result = img.clone();

        let mut flip = false;
        if let Some(rng) = rng {
            if self.rotation_degrees > 0.0 {
                let angle = rng.gen_range(-self.rotation_degrees..=self.rotation_degrees);
                result = rotate(&result, angle);
            }
            flip = rng.gen::<f32>() < self.horizontal_flip_prob;
        }

        result = resize_shorter_side(&result, self.sizes.resize);
        result = center_crop(&result, self.sizes.crop);
        if flip {
            result = result.fliph();
        }

        to_normalized_chw(&result)
    }
}

/// Rotate image around its center by the given angle in degrees, filling with black
fn rotate(img: &DynamicImage, angle_degrees: f32) -> DynamicImage {
    if angle_degrees.abs() < 0.1 {
        return img.clone();
    }

    let angle_rad = angle_degrees.to_radians();
    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let (sin_a, cos_a) = angle_rad.sin_cos();

    let mut output = ImageBuffer::new(width, height);
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = cx + dx * cos_a + dy * sin_a;
        let src_y = cy - dx * sin_a + dy * cos_a;
        *pixel = bilinear_sample(&rgb, src_x, src_y);
    }

    DynamicImage::ImageRgb8(output)
}

fn bilinear_sample(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();
    if x < 0.0 || y < 0.0 || x >= width as f32 - 1.0 || y >= height as f32 - 1.0 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let corners = [
        (img.get_pixel(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (img.get_pixel(x1, y0), fx * (1.0 - fy)),
        (img.get_pixel(x0, y1), (1.0 - fx) * fy),
        (img.get_pixel(x1, y1), fx * fy),
    ];

    let mut result = [0u8; 3];
    for (c, out) in result.iter_mut().enumerate() {
        let v: f32 = corners.iter().map(|(p, w)| p[c] as f32 * w).sum();
        *out = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(result)
}

/// Open an image and run the inference pipeline on it
///
/// Returns CHW data of shape `[3, crop, crop]`.
pub fn process_image<P: AsRef<Path>>(path: P, image_size: usize) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let img = open_image(path)?;
    Ok(ImageTransform::inference(image_size).apply(&img, None))
}

/// Open and decode an image file
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(|e| ClassifierError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .decode()
        .map_err(|e| ClassifierError::ImageLoad(path.to_path_buf(), e.to_string()))
}
