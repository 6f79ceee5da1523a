// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Workflow coordination only: these modules tell the data, ml
// and infra layers what to do, in which order, and do no
// numeric work themselves.

// The training workflow
pub mod train_use_case;

// Generation from a saved checkpoint
pub mod generate_use_case;
