//! Output directory layout and CSV persistence.
//!
//! Every run writes under `<dir>/<label>/`. Chunked pulls produce one file
//! per weekly chunk plus a merged `_complete` file; single-pass pulls
//! produce one file. Files are overwritten; a directory or file that cannot
//! be written is fatal to the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use spendpull_core::frame::TransactionFrame;

/// Output tree for one run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    run_dir: PathBuf,
}

impl OutputLayout {
    /// Create `<dir>/<label>/`, including parents.
    pub fn create(dir: impl AsRef<Path>, label: &str) -> Result<Self> {
        let run_dir = dir.as_ref().join(label);
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create output directory {}", run_dir.display()))?;
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Per-chunk file, 1-based: `{prefix}_week_{n}.csv`.
    pub fn chunk_path(&self, prefix: &str, week: usize) -> PathBuf {
        self.run_dir.join(format!("{prefix}_week_{week}.csv"))
    }

    /// Merged file written after all chunks: `{prefix}_{label}_complete.csv`.
    pub fn complete_path(&self, prefix: &str, label: &str) -> PathBuf {
        self.run_dir.join(format!("{prefix}_{label}_complete.csv"))
    }

    /// Single-pass file: `{prefix}_{label}.csv`.
    pub fn single_path(&self, prefix: &str, label: &str) -> PathBuf {
        self.run_dir.join(format!("{prefix}_{label}.csv"))
    }
}

/// Write a frame to `path`, overwriting any existing file.
pub fn write_frame(path: &Path, frame: &TransactionFrame) -> Result<()> {
    frame
        .write_csv(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
