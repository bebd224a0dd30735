// ============================================================
// Layer 4 — Array Dataset
// ============================================================
// Turns a list of RawArrays (columns) into something Burn's
// DataLoader can iterate:
//
//   columns:  features [N, 10]   labels [N]
//                 │                  │
//   get(i)  → Sample { fields: [ row i of features, row i of labels ] }
//
// Aliasing contract:
//   When no cast is requested, a column IS the caller's array
//   (same Arc). Writing through `RawArray::set` on either side
//   is visible on the other. Casting always allocates, so a
//   cast column is independent of the caller's array.
//
// Validation is fail-fast: no columns, mismatched leading
// dimensions, or zero samples are rejected here instead of
// surfacing later as a framework panic mid-epoch.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use anyhow::{bail, ensure, Result};
use burn::data::dataset::Dataset;

use crate::domain::array::{Buffer, ElementType, RawArray};

/// One sample field: row i of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub values: Buffer,
    /// Trailing dimensions of the column (empty for a 1-D column).
    pub shape:  Vec<usize>,
}

/// The aligned per-index tuple handed to the batcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub fields: Vec<Field>,
}

/// Column-oriented dataset over shared RawArrays.
#[derive(Debug, Clone)]
pub struct ArrayDataset {
    columns: Vec<RawArray>,
    len:     usize,
}

/// Build a dataset from equal-length arrays, optionally casting every
/// column to `dtype`.
///
/// Columns that need no cast alias the input arrays.
pub fn dataset_from_arrays(arrays: &[RawArray], dtype: Option<ElementType>) -> Result<ArrayDataset> {
    let Some(first) = arrays.first() else {
        bail!("a dataset needs at least one array");
    };

    let len = first.rows();
    for (i, arr) in arrays.iter().enumerate() {
        ensure!(
            arr.rows() == len,
            "array {} has {} samples but array 0 has {}",
            i, arr.rows(), len
        );
    }
    ensure!(len > 0, "cannot build a dataset from arrays with zero samples");

    let columns = arrays
        .iter()
        .map(|arr| match dtype {
            Some(target) if target != arr.element_type() => arr.cast(target),
            _ => arr.clone(),
        })
        .collect();

    tracing::debug!(
        "Built dataset: {} samples x {} columns (dtype override: {:?})",
        len, arrays.len(), dtype
    );

    Ok(ArrayDataset { columns, len })
}

impl ArrayDataset {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Handle to column `i`. Shares memory with the caller's array
    /// when no cast happened at construction.
    pub fn column(&self, i: usize) -> Option<&RawArray> {
        self.columns.get(i)
    }

    /// True when there is a second column to train against.
    pub fn has_labels(&self) -> bool {
        self.columns.len() > 1
    }

    /// Copy the rows at `indices` into a new, independent dataset.
    /// An empty index list yields an empty dataset.
    pub fn subset(&self, indices: &[usize]) -> Result<ArrayDataset> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.select_rows(indices))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArrayDataset { columns, len: indices.len() })
    }
}

impl Dataset<Sample> for ArrayDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        let fields = self
            .columns
            .iter()
            .map(|c| {
                c.row(index).map(|values| Field {
                    values,
                    shape: c.shape()[1..].to_vec(),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Sample { fields })
    }

    fn len(&self) -> usize {
        self.len
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn features_and_labels(n: usize) -> (RawArray, RawArray) {
        let x = RawArray::new((0..n * 3).map(|v| v as f32).collect(), [n, 3]).unwrap();
        let y = RawArray::new((0..n).map(|v| (v % 2) as i64).collect(), [n]).unwrap();
        (x, y)
    }

    #[test]
    fn test_len_and_rows_match_inputs() {
        let (x, y) = features_and_labels(5);
        let ds = dataset_from_arrays(&[x, y], None).unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.num_columns(), 2);

        let s = ds.get(3).unwrap();
        assert_eq!(s.fields[0].values, Buffer::F32(vec![9.0, 10.0, 11.0]));
        assert_eq!(s.fields[0].shape, vec![3]);
        assert_eq!(s.fields[1].values, Buffer::I64(vec![1]));
        assert!(s.fields[1].shape.is_empty());
        assert!(ds.get(5).is_none());
    }

    #[test]
    fn test_cast_applies_to_every_column() {
        let (x, y) = features_and_labels(4);
        let ds = dataset_from_arrays(&[x.clone(), y], Some(ElementType::F64)).unwrap();
        let s = ds.get(1).unwrap();
        assert_eq!(s.fields[0].values, Buffer::F64(vec![3.0, 4.0, 5.0]));
        assert_eq!(s.fields[1].values, Buffer::F64(vec![1.0]));
        assert!(!ds.column(0).unwrap().shares_memory(&x));
    }

    #[test]
    fn test_input_mutation_visible_in_dataset() {
        let (x, y) = features_and_labels(4);
        let ds = dataset_from_arrays(&[x.clone(), y], None).unwrap();
        x.set(&[2, 1], 42.0f32).unwrap();
        assert_eq!(ds.get(2).unwrap().fields[0].values, Buffer::F32(vec![6.0, 42.0, 8.0]));
    }

    #[test]
    fn test_dataset_mutation_visible_in_input() {
        let (x, y) = features_and_labels(4);
        let ds = dataset_from_arrays(&[x, y.clone()], None).unwrap();
        ds.column(1).unwrap().set(&[0], 7i64).unwrap();
        assert_eq!(y.get::<i64>(&[0]), Some(7));
    }

    #[test]
    fn test_same_dtype_override_still_aliases() {
        let (x, _) = features_and_labels(2);
        let ds = dataset_from_arrays(&[x.clone()], Some(ElementType::F32)).unwrap();
        assert!(ds.column(0).unwrap().shares_memory(&x));
    }

    #[test]
    fn test_cast_breaks_aliasing() {
        let (x, _) = features_and_labels(2);
        let ds = dataset_from_arrays(&[x.clone()], Some(ElementType::F64)).unwrap();
        x.set(&[0, 0], 100.0f32).unwrap();
        assert_eq!(ds.get(0).unwrap().fields[0].values, Buffer::F64(vec![0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let (x, _) = features_and_labels(5);
        let (_, y) = features_and_labels(4);
        let err = dataset_from_arrays(&[x, y], None).unwrap_err();
        assert!(err.to_string().contains("samples"));
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(dataset_from_arrays(&[], None).is_err());
        let empty = RawArray::new(Vec::<f32>::new(), [0, 3]).unwrap();
        assert!(dataset_from_arrays(&[empty], None).is_err());
    }

    #[test]
    fn test_subset_copies_rows() {
        let (x, y) = features_and_labels(6);
        let ds  = dataset_from_arrays(&[x.clone(), y], None).unwrap();
        let sub = ds.subset(&[4, 1]).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get(0).unwrap().fields[1].values, Buffer::I64(vec![0]));
        assert_eq!(sub.get(1).unwrap().fields[0].values, Buffer::F32(vec![3.0, 4.0, 5.0]));
        assert!(!sub.column(0).unwrap().shares_memory(&x));
    }
}
