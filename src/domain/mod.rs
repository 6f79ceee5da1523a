// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types that describe what the system works with:
// characters, their integer indices, and fixed-length windows
// of those indices.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Everything here is unit-testable without a backend.

// The character alphabet and its index codec
pub mod vocabulary;

// A fixed-length, padded window of character indices
pub mod chunk;

// Core abstractions other layers implement
pub mod traits;
