// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All tensor math lives here. Other layers only hand over
// ArrayDatasets and receive models or host-side TensorData.
//
// What's in this layer:
//
//   backend.rs    — NdArray / Wgpu aliases for the binary
//
//   model.rs      — the Forward capability every model offers,
//                   plus a small reference classifier
//                   (optional hidden layer, dropout, log_softmax)
//
//   loss.rs       — NLL (default), cross-entropy, MSE
//
//   trainer.rs    — shuffled mini-batch Adam training loop
//
//   inferencer.rs — ordered, batched, gradient-free inference
//                   and evaluation
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Backend aliases used by the CLI
pub mod backend;

/// Forward trait and the reference classifier
pub mod model;

/// Loss functions
pub mod loss;

/// Training loop
pub mod trainer;

/// Inference and evaluation
pub mod inferencer;
