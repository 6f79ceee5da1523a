// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything from the raw corpus file to model-ready tensors.
//
// The pipeline flows in this order:
//
//   corpus .txt file
//       │
//       ▼
//   LineCorpusLoader   → reads and trims one example per line
//       │
//       ▼
//   WindowedChunker    → endless, reshuffled fixed-length windows
//       │
//       ▼
//   BatchStream        → groups windows into batches
//       │
//       ▼
//   CharBatcher        → one-hot tensors for the model
//
// Every stage is lazy: the trainer pulls one batch at a time.

/// Reads the line-per-example corpus file
pub mod loader;

/// Cuts encoded lines into overlapping padded windows, epoch after epoch
pub mod chunker;

/// Groups chunks into fixed-size batches
pub mod stream;

/// Converts a batch of chunks into a one-hot tensor
pub mod batcher;
