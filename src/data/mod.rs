// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between "some arrays" and "tensor batches":
//
//   ArraySource (json file / synthetic blobs)
//       │
//       ▼
//   Vec<RawArray>     → one array per column
//       │
//       ▼
//   split_indices     → train / validation rows (optional)
//       │
//       ▼
//   ArrayDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ArrayBatcher      → stacks samples into tensors
//       │
//       ▼
//   DataLoader        → feeds batches to trainer / inferencer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Builds a Burn Dataset from RawArrays
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits sample indices into train/validation sets
pub mod splitter;

/// Labelled blob generator for demos and tests
pub mod synthetic;
