use crate::analyzers::RunSummary;
use crate::error::Result;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a run summary as pretty-printed JSON
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
