use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::RawRecord;

/// Writes raw records as JSON lines
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `rows`. Parent directories are created.
    pub fn write_all(&self, rows: &[RawRecord]) -> PipelineResult<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut out = BufWriter::new(File::create(&self.path)?);
        for row in rows {
            serde_json::to_writer(&mut out, row)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        log::info!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }
}

/// Read a JSONL dataset. Blank lines are skipped; anything else that is
/// not a flat object fails with the offending line number.
pub fn read_jsonl(path: &Path) -> PipelineResult<Vec<RawRecord>> {
    if !path.exists() {
        return Err(PipelineError::ArtifactMissing(path.to_path_buf()));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = RawRecord::from_json_str(&line).map_err(|e| {
            PipelineError::invalid_input(format!("{}:{}: {}", path.display(), i + 1, e))
        })?;
        rows.push(record);
    }

    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
