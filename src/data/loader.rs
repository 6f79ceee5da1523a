// ============================================================
// Layer 4: Corpus Loader
// ============================================================
// Reads the plain-text training corpus: one short example per
// line, e.g. one tweet per line. The whole file is read once
// into memory when the pipeline starts.
//
// Each line is trimmed of surrounding whitespace (this also
// strips the '\r' of Windows line endings). Blank lines are
// kept; they encode to nothing and so never produce a chunk.
//
// A missing or unreadable corpus is fatal: there is nothing
// to train on, so the error propagates straight to main.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::traits::CorpusSource;

/// Loads `<data_dir>/<model>.txt`.
pub struct LineCorpusLoader {
    path: PathBuf,
}

impl LineCorpusLoader {
    /// Point the loader at a corpus file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional corpus location for a named model.
    pub fn for_model(data_dir: &str, model: &str) -> Self {
        Self::new(PathBuf::from(data_dir).join(format!("{model}.txt")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CorpusSource for LineCorpusLoader {
    fn load_lines(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;

        let lines: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();

        tracing::info!(
            "Loaded {} lines from '{}'",
            lines.len(),
            self.path.display()
        );
        Ok(lines)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_trims_lines() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.txt");
        fs::write(&path, "  hello world \r\nsecond\n\nthird").unwrap();

        let lines = LineCorpusLoader::new(&path).load_lines().unwrap();
        assert_eq!(lines, vec!["hello world", "second", "", "third"]);
    }

    #[test]
    fn test_for_model_builds_conventional_path() {
        let loader = LineCorpusLoader::for_model("data", "trump_tweets");
        assert_eq!(loader.path(), &PathBuf::from("data/trump_tweets.txt"));
    }

    #[test]
    fn test_missing_corpus_is_an_error() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = LineCorpusLoader::new(dir.path().join("nope.txt"));
        let err    = loader.load_lines().unwrap_err();
        assert!(err.to_string().contains("Cannot read corpus"));
    }
}
