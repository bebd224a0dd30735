// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs  — model weights (Burn CompactRecorder) and
//                    the TrainConfig JSON needed to rebuild the
//                    model before loading them
//
//   metrics.rs     — per-epoch metrics, appended to a CSV file
//
//   array_store.rs — JSON array files in and out; implements
//                    the ArraySource trait
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// JSON array file reader / writer
pub mod array_store;
