//! Category names
//!
//! A JSON object mapping class keys (the class-folder names) to
//! human-readable labels, e.g. `{"1": "pink primrose", "2": "hard-leaved pocket orchid"}`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::utils::error::{ClassifierError, Result};

/// Read-only mapping from class key to display name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap {
    names: HashMap<String, String>,
}

impl CategoryMap {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Display name for a class key
    pub fn name_for(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            ClassifierError::InvalidInput(format!("class '{}' has no category name", key))
        })
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.values().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Load category names from a JSON file
///
/// Read or parse failures are logged and returned; no partial map is produced.
pub fn load_names<P: AsRef<Path>>(path: P) -> Result<CategoryMap> {
    let path = path.as_ref();

    let json = std::fs::read_to_string(path).map_err(|e| {
        error!("Cannot read category names from {:?}: {}", path, e);
        ClassifierError::Categories {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let names: HashMap<String, String> = serde_json::from_str(&json).map_err(|e| {
        error!("Cannot parse category names in {:?}: {}", path, e);
        ClassifierError::Categories {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    info!("Loaded {} category names from {:?}", names.len(), path);
    Ok(CategoryMap::new(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat_to_name.json");
        std::fs::write(&path, r#"{"1": "pink primrose", "21": "fire lily"}"#).unwrap();

        let map = load_names(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("21"), Some("fire lily"));
        assert_eq!(map.name_for("1").unwrap(), "pink primrose");
        assert!(matches!(map.name_for("99"), Err(ClassifierError::InvalidInput(_))));
        assert!(map.contains_name("pink primrose"));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_names(temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ClassifierError::Categories { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat_to_name.json");
        std::fs::write(&path, r#"{"1": "pink primrose", "2": "#).unwrap();

        let err = load_names(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::Categories { .. }));
    }

    #[test]
    fn test_non_string_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat_to_name.json");
        std::fs::write(&path, r#"{"1": "pink primrose", "2": 3}"#).unwrap();

        assert!(load_names(&path).is_err());
    }
}
