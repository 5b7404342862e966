use rayon::prelude::*;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::sketches::count_min::CountMinSketch;
use crate::sketches::exact::ExactCounter;
use crate::traits::Accumulator;
use crate::utils::constants::DEFAULT_SHARD_CHUNK_SIZE;

/// A frequency table that can be split into private shards and summed back
pub trait Shardable: Accumulator<Output = ()> + Send + Sync + Sized {
    fn empty_like(&self) -> Self;
    fn merge(&mut self, other: &Self) -> Result<()>;
}

impl Shardable for CountMinSketch {
    fn empty_like(&self) -> Self {
        CountMinSketch::empty_like(self)
    }

    fn merge(&mut self, other: &Self) -> Result<()> {
        CountMinSketch::merge(self, other)
    }
}

impl Shardable for ExactCounter {
    fn empty_like(&self) -> Self {
        ExactCounter::empty_like(self)
    }

    fn merge(&mut self, other: &Self) -> Result<()> {
        ExactCounter::merge(self, other)
    }
}

/// Parallel ingestion of value batches into frequency tables
///
/// Each batch is split across workers; every worker fills a private, empty
/// copy of the target and the copies are merged back. Cell updates are
/// additions, so the result equals sequential ingestion.
pub struct ShardedIngest {
    shards: usize,
    chunk_size: usize,
    pool: rayon::ThreadPool,
}

impl ShardedIngest {
    pub fn new(shards: usize) -> Result<Self> {
        if shards == 0 {
            return Err(ProcessingError::Config(
                "Shard count must be positive".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(shards)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        Ok(Self {
            shards,
            chunk_size: DEFAULT_SHARD_CHUNK_SIZE,
            pool,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Preferred batch length for callers that buffer values
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Ingest `values` into `target`
    pub fn ingest<T: Shardable>(&self, target: &mut T, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        for chunk in values.chunks(self.chunk_size) {
            let part_len = chunk.len().div_ceil(self.shards);
            let template = &*target;

            let partials: Vec<T> = self.pool.install(|| {
                chunk
                    .par_chunks(part_len)
                    .map(|part| {
                        let mut shard = template.empty_like();
                        for &value in part {
                            shard.ingest(value);
                        }
                        shard
                    })
                    .collect()
            });

            debug!(values = chunk.len(), shards = partials.len(), "merging shards");
            for partial in &partials {
                target.merge(partial)?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for ShardedIngest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedIngest")
            .field("shards", &self.shards)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}
