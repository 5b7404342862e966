use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Incremental CSV sink for output rows
///
/// Rows are flushed through a buffered writer as they arrive; the header is
/// taken from the first row's field names.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

/// Open a row destination; `-` means standard output
pub fn open_destination(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout().lock()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

impl ResultWriter<Box<dyn Write>> {
    /// Write to `path` (parent directories are created) or to stdout for `-`
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_writer(open_destination(path)?))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(true).from_writer(writer),
            rows_written: 0,
        }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows<'a, T, I>(&mut self, rows: I) -> Result<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::ProcessingError::Io(e.into_error()))
    }
}
