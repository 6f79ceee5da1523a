// ============================================================
// Layer 3: Core Traits
// ============================================================
// The application layer reads its corpus through this trait so
// the training workflow does not care whether lines come from
// a file on disk or an in-memory fixture in a test.

use anyhow::Result;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can hand over a training corpus, one example
/// per line.
///
/// Implementations:
///   - LineCorpusLoader → reads `<data_dir>/<model>.txt`
pub trait CorpusSource {
    /// Load every line of the corpus, in file order.
    fn load_lines(&self) -> Result<Vec<String>>;
}

impl CorpusSource for Vec<String> {
    fn load_lines(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}
