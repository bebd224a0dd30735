// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// One place that decides which Burn backend the binary runs on.
//
//   default build      → NdArray (CPU, always available)
//   --features wgpu    → Wgpu (GPU through WebGPU)
//
// Training always wraps the inner backend in Autodiff; the
// trained model's `.valid()` twin lives on InferBackend.
//
// The library API itself is generic over any Backend — these
// aliases are only for the CLI use cases.

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
