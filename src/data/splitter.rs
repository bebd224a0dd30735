// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles sample indices and cuts them into two lists:
//   - Training indices:   rows used to update model weights
//   - Validation indices: rows used to measure generalisation
//
// Only indices are shuffled here; the rows themselves are
// copied afterwards with `ArrayDataset::subset`. Arrays are
// often sorted by class, so an unshuffled split would leave
// whole classes out of validation.
//
// A seed makes the split reproducible; without one the
// thread-local RNG is used.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `0..total` and split it into (train, validation).
///
/// `train_fraction` is clamped to `[0, 1]`; the split point is rounded.
pub fn split_indices(total: usize, train_fraction: f64, seed: Option<u64>) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..total).collect();

    match seed {
        Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
        None       => indices.shuffle(&mut rand::thread_rng()),
    }

    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = ((total as f64) * fraction).round() as usize;
    let split_at = split_at.min(total);

    // split_off(n) leaves [0..n) in `indices` and returns [n..total)
    let val = indices.split_off(split_at);

    tracing::debug!(
        "Index split: {} training, {} validation",
        indices.len(),
        val.len(),
    );

    (indices, val)
}
