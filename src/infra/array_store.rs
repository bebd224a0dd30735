// ============================================================
// Layer 6 — JSON Array Store
// ============================================================
// Reads and writes arrays as a small JSON document:
//
//   {
//     "columns": [
//       { "dtype": "f32", "shape": [4, 2], "values": [0.1, 0.2, ...] },
//       { "dtype": "i64", "shape": [4],    "values": [0, 1, 1, 0] }
//     ]
//   }
//
// Values are JSON numbers (read as f64) and cast to `dtype`
// on load. The predict command writes its outputs in the
// same format, so a prediction file can be read back as a
// one-column array file.
//
// Reference: serde_json documentation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{
    array::{Buffer, ElementType, RawArray},
    traits::ArraySource,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub dtype:  ElementType,
    pub shape:  Vec<usize>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArrayFile {
    pub columns: Vec<ColumnRecord>,
}

impl ColumnRecord {
    pub fn from_array(array: &RawArray) -> Self {
        Self {
            dtype:  array.element_type(),
            shape:  array.shape().to_vec(),
            values: array.to_buffer().to_f64_vec(),
        }
    }

    pub fn into_array(self) -> Result<RawArray> {
        let buffer = Buffer::F64(self.values).cast(self.dtype);
        RawArray::from_buffer(buffer, self.shape)
    }
}

/// An `ArraySource` backed by a JSON file on disk.
pub struct JsonArrayStore {
    path: PathBuf,
}

impl JsonArrayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `arrays` to `path`, replacing any existing file.
    pub fn save(path: impl AsRef<Path>, arrays: &[RawArray]) -> Result<()> {
        let path = path.as_ref();
        let file = ArrayFile {
            columns: arrays.iter().map(ColumnRecord::from_array).collect(),
        };
        let json = serde_json::to_string(&file)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write arrays to '{}'", path.display()))?;
        tracing::debug!("Wrote {} column(s) to '{}'", arrays.len(), path.display());
        Ok(())
    }
}

impl ArraySource for JsonArrayStore {
    fn load_arrays(&self) -> Result<Vec<RawArray>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read array file '{}'", self.path.display()))?;
        let file: ArrayFile = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid array file", self.path.display()))?;

        file.columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                c.into_array()
                    .with_context(|| format!("column {} of '{}'", i, self.path.display()))
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!("array file '{}'", self.path.display())
    }
}
