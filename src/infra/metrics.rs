// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - loss:       mean summed cross-entropy on the training set
//                 (the monitored quantity)
//   - val_loss:   the same on the held-out 30%
//   - pitch_acc:  share of validation pitches predicted exactly
//   - dur_acc:    share of validation durations predicted exactly
//   - improved:   whether this epoch saved new best weights
//
// Output file: weights/<scale>/metrics.csv
//
// Example CSV output:
//   epoch,loss,val_loss,pitch_acc,dur_acc,improved
//   1,5.124500,5.089200,0.123000,0.418000,true
//   2,4.890100,4.954300,0.184000,0.472000,true
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean training loss — pitch CE + duration CE
    pub train_loss: f64,

    /// Mean validation loss
    pub val_loss: f64,

    /// Range: [0.0, 1.0]
    pub pitch_acc: f64,

    /// Range: [0.0, 1.0]
    pub length_acc: f64,

    pub improved: bool,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        pitch_acc:  f64,
        length_acc: f64,
        improved:   bool,
    ) -> Self {
        Self { epoch, train_loss, val_loss, pitch_acc, length_acc, improved }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh log for one training run.
    /// A `metrics.csv` left by an earlier run is truncated.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,loss,val_loss,pitch_acc,dur_acc,improved")?;
        tracing::debug!("Started metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.pitch_acc,
            m.length_acc,
            m.improved,
        )?;

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 2.5, 2.7, 0.2, 0.5, true)).unwrap();
        logger.log(&EpochMetrics::new(2, 2.6, 2.8, 0.2, 0.5, false)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,loss,val_loss,pitch_acc,dur_acc,improved");
        assert!(lines[1].starts_with("1,2.500000,"));
        assert!(lines[2].ends_with(",false"));
    }

    #[test]
    fn test_new_run_starts_a_fresh_log() {
        let dir   = tempfile::tempdir().unwrap();
        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log(&EpochMetrics::new(1, 2.5, 2.7, 0.2, 0.5, true)).unwrap();
        first.log(&EpochMetrics::new(2, 2.4, 2.6, 0.3, 0.5, true)).unwrap();

        let second = MetricsLogger::new(dir.path()).unwrap();
        second.log(&EpochMetrics::new(1, 3.0, 3.1, 0.1, 0.4, true)).unwrap();

        let text = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "epoch,loss,val_loss,pitch_acc,dur_acc,improved");
        assert!(lines[1].starts_with("1,3.000000,"));
    }
}
