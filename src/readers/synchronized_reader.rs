use crate::error::{ProcessingError, Result};
use crate::models::StationRecord;
use crate::readers::record_reader::{RecordIterator, RecordReader};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads several station files in lockstep, one record from each per step
///
/// The caller guarantees positional alignment (identical time ranges).
/// Iteration ends with the shortest input; leftover records in longer
/// inputs are reported and ignored.
pub struct SynchronizedReader<R> {
    streams: Vec<RecordIterator<R>>,
    sources: Vec<PathBuf>,
    steps: usize,
    finished: bool,
}

impl SynchronizedReader<BufReader<File>> {
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        if paths.is_empty() {
            return Err(ProcessingError::MissingData(
                "no input files for synchronized reading".to_string(),
            ));
        }

        let reader = RecordReader::new();
        let streams = paths
            .iter()
            .map(|path| reader.stream_records(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            streams,
            sources: paths.to_vec(),
            steps: 0,
            finished: false,
        })
    }
}

impl<R: BufRead> SynchronizedReader<R> {
    pub fn from_streams(streams: Vec<RecordIterator<R>>) -> Self {
        let sources = (1..=streams.len())
            .map(|i| PathBuf::from(format!("stream-{}", i)))
            .collect();
        Self {
            streams,
            sources,
            steps: 0,
            finished: false,
        }
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Complete tuples produced so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn source(&self, index: usize) -> &Path {
        &self.sources[index]
    }
}

impl<R: BufRead> Iterator for SynchronizedReader<R> {
    type Item = Result<Vec<StationRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut tuple = Vec::with_capacity(self.streams.len());
        let mut exhausted = Vec::new();

        for (index, stream) in self.streams.iter_mut().enumerate() {
            match stream.next() {
                Some(Ok(record)) => tuple.push(record),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => exhausted.push(index),
            }
        }

        if exhausted.is_empty() {
            self.steps += 1;
            return Some(Ok(tuple));
        }

        self.finished = true;
        if exhausted.len() < self.streams.len() {
            let ended: Vec<String> = exhausted
                .iter()
                .map(|&i| self.source(i).display().to_string())
                .collect();
            warn!(
                steps = self.steps,
                ended = %ended.join(", "),
                "inputs have different lengths; stopping at the shortest"
            );
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::tests::sample_line;
    use crate::models::Field;
    use std::io::Cursor;

    fn stream(values: &[f64]) -> RecordIterator<Cursor<String>> {
        let text: String = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}\n", sample_line("20210101", &format!("00{:02}", i * 5), *v)))
            .collect();
        RecordReader::new().stream_from(Cursor::new(text))
    }

    #[test]
    fn test_lockstep_tuples() {
        let reader = SynchronizedReader::from_streams(vec![
            stream(&[1.0, 2.0]),
            stream(&[10.0, 20.0]),
            stream(&[100.0, 200.0]),
        ]);
        assert_eq!(reader.stream_count(), 3);

        let tuples: Vec<Vec<StationRecord>> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(tuples.len(), 2);
        let second: Vec<f64> = tuples[1]
            .iter()
            .map(|r| r.value(Field::AirTemperature).unwrap())
            .collect();
        assert_eq!(second, vec![2.0, 20.0, 200.0]);
    }

    #[test]
    fn test_stops_at_shortest_input() {
        let mut reader = SynchronizedReader::from_streams(vec![
            stream(&[1.0, 2.0, 3.0]),
            stream(&[10.0]),
        ]);

        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
        assert_eq!(reader.steps(), 1);
    }

    #[test]
    fn test_open_requires_inputs() {
        assert!(SynchronizedReader::open(&[]).is_err());
    }
}
