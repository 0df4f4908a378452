use std::path::Path;

use anyhow::Result;
use tracing::info;

use sentinel_core::logic::dataset::DatasetWriter;
use sentinel_core::logic::synthetic;
use sentinel_core::Theme;

pub fn run(theme: Theme, samples: usize, seed: u64, out: &Path) -> Result<()> {
    info!("Generating {} {} rows (seed {})", samples, theme, seed);

    let rows = synthetic::generate(theme, samples, seed);
    let written = DatasetWriter::new(out).write_all(&rows)?;

    info!("Wrote {} rows to {}", written, out.display());
    Ok(())
}
