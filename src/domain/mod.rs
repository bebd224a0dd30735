// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the data IS before any
// framework touches it.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// RawArray lives here because both the data layer (datasets)
// and the infra layer (JSON store) speak it.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Shared n-dimensional numeric buffers
pub mod array;

/// Core abstractions (traits) that other layers implement
pub mod traits;
