//! Utility functions for document construction and persistence

use gltf_json as json;
use std::path::Path;

use crate::error::{AssetError, Result};

/// Axis-aligned bounding box of a position stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Cube of half-extent `radius` centred on the origin
    pub fn cube(radius: f32) -> Self {
        Self {
            min: [-radius; 3],
            max: [radius; 3],
        }
    }

    pub(crate) fn min_value(&self) -> json::Value {
        json::Value::Array(self.min.iter().copied().map(json::Value::from).collect())
    }

    pub(crate) fn max_value(&self) -> json::Value {
        json::Value::Array(self.max.iter().copied().map(json::Value::from).collect())
    }
}

/// Compute bounding box for positions
pub fn compute_bounds(positions: &[[f32; 3]]) -> Bounds {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    Bounds { min, max }
}

/// Add `name` to an extension list unless it is already present
///
/// Returns `true` when the list changed.
pub fn register_extension(list: &mut Vec<String>, name: &str) -> bool {
    if list.iter().any(|e| e == name) {
        return false;
    }
    list.push(name.to_string());
    true
}

/// Load a glTF JSON document
pub fn read_document(path: &Path) -> Result<json::Root> {
    let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| AssetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a document to pretty-printed JSON
pub fn document_to_string(root: &json::Root) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(root)
}

/// Persist a glTF JSON document in a single write
pub fn write_document(path: &Path, root: &json::Root) -> Result<()> {
    let text = document_to_string(root).map_err(|source| AssetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|e| AssetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bounds_simple() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]];
        let bounds = compute_bounds(&positions);
        assert_eq!(bounds.min, [-1.0, -2.0, -3.0]);
        assert_eq!(bounds.max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bounds_json_values() {
        let bounds = Bounds::cube(0.5);
        assert_eq!(bounds.min_value().to_string(), "[-0.5,-0.5,-0.5]");
        assert_eq!(bounds.max_value().to_string(), "[0.5,0.5,0.5]");
    }

    #[test]
    fn test_register_extension_is_idempotent() {
        let mut used = Vec::new();
        assert!(register_extension(&mut used, "KHR_lights_punctual"));
        assert!(!register_extension(&mut used, "KHR_lights_punctual"));
        assert!(register_extension(&mut used, "KHR_materials_unlit"));
        assert_eq!(used, vec!["KHR_lights_punctual", "KHR_materials_unlit"]);
    }
}
