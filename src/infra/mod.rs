// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Persistence concerns shared by training and generation:
//
//   checkpoint.rs - versioned, atomically written snapshots of
//                   parameters, optimizer state and global step,
//                   plus the saved training config
//
//   metrics.rs    - per-interval step/loss/time rows in a CSV

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
