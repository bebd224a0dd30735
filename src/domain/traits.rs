// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer never cares where arrays come from.
// Anything that can hand back a list of equal-length
// RawArrays implements ArraySource:
//
//   - JsonArrayStore  → reads a JSON array file (infra)
//   - BlobSource      → generates labelled Gaussian-ish blobs (data)
//
// The use cases only see `dyn ArraySource`, so a new input
// format is one new impl and no other change.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use anyhow::Result;

use crate::domain::array::RawArray;

// ─── ArraySource ──────────────────────────────────────────────────────────────
/// Any component that can produce the columns of a dataset.
///
/// Column 0 is the model input, column 1 (when present) the label.
pub trait ArraySource {
    /// Load every column. All arrays share the same leading dimension.
    fn load_arrays(&self) -> Result<Vec<RawArray>>;

    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;
}
