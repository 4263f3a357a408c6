//! Image Folder Loader
//!
//! Discovers `train/`, `valid/` and `test/` splits where every class lives in
//! its own sub-folder. Class indices come from the sorted folder names of the
//! train split and are reused for the other splits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::IMAGE_EXTENSIONS;
use crate::utils::error::{ClassifierError, Result};

/// A single image sample with its label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
}

/// One split of a class-per-folder image dataset
#[derive(Debug, Clone)]
pub struct ImageFolder {
    /// Root directory of the split
    pub root_dir: PathBuf,
    /// All samples in the split
    pub samples: Vec<ImageSample>,
    /// Class folder names, index = label
    pub class_names: Vec<String>,
}

impl ImageFolder {
    /// Scan a split, deriving the classes from its sorted sub-folder names
    pub fn scan<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        if !root_dir.is_dir() {
            return Err(ClassifierError::DatasetNotFound(root_dir));
        }

        let mut class_names = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        if class_names.is_empty() {
            return Err(ClassifierError::EmptyDataset(
                root_dir,
                "no class folders".to_string(),
            ));
        }

        Self::with_classes(root_dir, &class_names)
    }

    /// Scan a split using an existing class list
    ///
    /// Folders whose name is not in `class_names` are skipped with a warning.
    pub fn with_classes<P: AsRef<Path>>(root_dir: P, class_names: &[String]) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        if !root_dir.is_dir() {
            return Err(ClassifierError::DatasetNotFound(root_dir));
        }

        let class_to_idx: HashMap<&str, usize> = class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let mut folders = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    folders.push(name.to_string());
                }
            }
        }
        folders.sort();

        let mut samples = Vec::new();
        for folder in &folders {
            let Some(&label) = class_to_idx.get(folder.as_str()) else {
                warn!(
                    "Skipping class folder '{}' in {:?}: not present in the training split",
                    folder, root_dir
                );
                continue;
            };

            let before = samples.len();
            let mut paths: Vec<PathBuf> = WalkDir::new(root_dir.join(folder))
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_image_file(p))
                .collect();
            paths.sort();
            samples.extend(paths.into_iter().map(|path| ImageSample { path, label }));

            debug!(
                "Class '{}' (label {}): {} samples",
                folder,
                label,
                samples.len() - before
            );
        }

        if samples.is_empty() {
            return Err(ClassifierError::EmptyDataset(
                root_dir,
                "no images found".to_string(),
            ));
        }

        info!(
            "Loaded {} samples in {} classes from {:?}",
            samples.len(),
            class_names.len(),
            root_dir
        );

        Ok(Self {
            root_dir,
            samples,
            class_names: class_names.to_vec(),
        })
    }

    /// Get the number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Train, validation and optional test splits of one dataset
#[derive(Debug, Clone)]
pub struct DataSplits {
    pub train: ImageFolder,
    pub valid: ImageFolder,
    pub test: Option<ImageFolder>,
}

impl DataSplits {
    /// Load `train/` and `valid/` (required) and `test/` (optional) under `data_dir`
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        info!("Loading dataset from: {:?}", data_dir);

        let train = ImageFolder::scan(data_dir.join("train"))?;
        let valid = ImageFolder::with_classes(data_dir.join("valid"), &train.class_names)?;

        let test_dir = data_dir.join("test");
        let test = if test_dir.is_dir() {
            Some(ImageFolder::with_classes(test_dir, &train.class_names)?)
        } else {
            warn!("No test split found at {:?}", test_dir);
            None
        };

        Ok(Self { train, valid, test })
    }

    /// Class folder names, index = label
    pub fn class_names(&self) -> &[String] {
        &self.train.class_names
    }
}
