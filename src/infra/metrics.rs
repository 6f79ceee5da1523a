// ============================================================
// Layer 6: Metrics Logger
// ============================================================
// Appends one CSV row per logging interval so a training run
// can be plotted afterwards.
//
// Output file: checkpoints/<model>/metrics.csv
//
//   step,loss,elapsed_secs
//   50,11432.118164,8.412
//   100,9871.502930,8.107
//
// The file is appended to across resumed runs; the step column
// keeps increasing because the step counter is restored from
// the checkpoint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One logging interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Global step at the end of the interval
    pub step: u64,
    /// Summed cross-entropy of the interval's last batch
    pub loss: f64,
    /// Wall time since the previous log line
    pub elapsed_secs: f64,
}

impl StepMetrics {
    pub fn new(step: u64, loss: f64, elapsed_secs: f64) -> Self {
        Self { step, loss, elapsed_secs }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and the CSV header if they are missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "step,loss,elapsed_secs")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &StepMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.3}", m.step, m.loss, m.elapsed_secs)?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&StepMetrics::new(50, 12.5, 1.0)).unwrap();

        // A resumed run reopens the same file
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&StepMetrics::new(100, 10.25, 2.5)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(
            csv,
            "step,loss,elapsed_secs\n50,12.500000,1.000\n100,10.250000,2.500\n"
        );
    }
}
