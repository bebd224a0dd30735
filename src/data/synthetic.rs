// ============================================================
// Layer 4 — Synthetic Blobs
// ============================================================
// Generates a labelled classification problem so the CLI can
// train end-to-end without an input file:
//
//   1. draw one centre per class, uniform in [-spread, spread]^F
//   2. for every sample pick class i % C
//   3. sample = centre + uniform noise in [-1, 1]^F
//
// Output columns:
//   features  f32  [N, F]
//   labels    i64  [N]      (values in 0..C)
//
// Reference: rand crate documentation (StdRng, Rng::gen_range)

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::{array::RawArray, traits::ArraySource};

const CENTRE_SPREAD: f32 = 4.0;

/// Blob generator; implements `ArraySource`.
#[derive(Debug, Clone)]
pub struct BlobSource {
    pub samples:  usize,
    pub features: usize,
    pub classes:  usize,
    pub seed:     u64,
}

impl BlobSource {
    pub fn new(samples: usize, features: usize, classes: usize, seed: u64) -> Self {
        Self { samples, features, classes, seed }
    }
}

impl ArraySource for BlobSource {
    fn load_arrays(&self) -> Result<Vec<RawArray>> {
        ensure!(self.features > 0, "blob features must be > 0");
        ensure!(self.classes > 0, "blob classes must be > 0");

        let mut rng = StdRng::seed_from_u64(self.seed);

        let centres: Vec<Vec<f32>> = (0..self.classes)
            .map(|_| {
                (0..self.features)
                    .map(|_| rng.gen_range(-CENTRE_SPREAD..CENTRE_SPREAD))
                    .collect()
            })
            .collect();

        let mut features = Vec::with_capacity(self.samples * self.features);
        let mut labels   = Vec::with_capacity(self.samples);
        for i in 0..self.samples {
            let class = i % self.classes;
            for &c in &centres[class] {
                features.push(c + rng.gen_range(-1.0f32..1.0));
            }
            labels.push(class as i64);
        }

        Ok(vec![
            RawArray::new(features, [self.samples, self.features])?,
            RawArray::new(labels, [self.samples])?,
        ])
    }

    fn describe(&self) -> String {
        format!(
            "synthetic blobs ({} samples, {} features, {} classes, seed {})",
            self.samples, self.features, self.classes, self.seed
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_and_label_range() {
        let arrays = BlobSource::new(100, 10, 3, 1).load_arrays().unwrap();
        assert_eq!(arrays[0].shape(), &[100, 10]);
        assert_eq!(arrays[1].shape(), &[100]);
        let labels = arrays[1].to_vec::<i64>().unwrap();
        assert!(labels.iter().all(|&l| (0..3).contains(&l)));
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = BlobSource::new(20, 4, 2, 7).load_arrays().unwrap();
        let b = BlobSource::new(20, 4, 2, 7).load_arrays().unwrap();
        assert_eq!(a[0].to_vec::<f32>(), b[0].to_vec::<f32>());
    }

    #[test]
    fn test_rejects_zero_classes() {
        assert!(BlobSource::new(10, 2, 0, 0).load_arrays().is_err());
    }
}
