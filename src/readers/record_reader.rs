use crate::error::Result;
use crate::models::{RecordAnnotator, StationRecord};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads sub-hourly station files one record at a time
pub struct RecordReader {
    annotator: RecordAnnotator,
    skip_blank_lines: bool,
}

impl RecordReader {
    pub fn new() -> Self {
        Self {
            annotator: RecordAnnotator::new(),
            skip_blank_lines: true,
        }
    }

    pub fn with_skip_blank_lines(skip_blank_lines: bool) -> Self {
        Self {
            annotator: RecordAnnotator::new(),
            skip_blank_lines,
        }
    }

    /// Stream records from a file (memory use independent of file size)
    pub fn stream_records(&self, path: &Path) -> Result<RecordIterator<BufReader<File>>> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        Ok(self.stream_from(reader))
    }

    /// Stream records from any buffered source
    pub fn stream_from<R: BufRead>(&self, reader: R) -> RecordIterator<R> {
        RecordIterator {
            reader,
            annotator: self.annotator,
            skip_blank_lines: self.skip_blank_lines,
            line_count: 0,
            finished: false,
        }
    }

    /// Read every record of a file into memory
    pub fn read_records(&self, path: &Path) -> Result<Vec<StationRecord>> {
        self.stream_records(path)?.collect()
    }
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the records of one input
///
/// Stops after the first error; a malformed line is never skipped.
pub struct RecordIterator<R> {
    reader: R,
    annotator: RecordAnnotator,
    skip_blank_lines: bool,
    line_count: usize,
    finished: bool,
}

impl<R: BufRead> RecordIterator<R> {
    /// Lines consumed so far, blank lines included
    pub fn line_count(&self) -> usize {
        self.line_count
    }
}

impl<R: BufRead> Iterator for RecordIterator<R> {
    type Item = Result<StationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut line = String::new();

        loop {
            line.clear();

            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None; // EOF
                }
                Ok(_) => {
                    self.line_count += 1;

                    if self.skip_blank_lines && line.trim().is_empty() {
                        continue;
                    }

                    let result = self
                        .annotator
                        .annotate(&line)
                        .map_err(|e| e.at_line(self.line_count));
                    if result.is_err() {
                        self.finished = true;
                    }
                    return Some(result);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
