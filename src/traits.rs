//! Two-operation interface shared by the streaming accumulators
//!
//! [`RunningStats`](crate::processors::RunningStats),
//! [`CountMinSketch`](crate::sketches::CountMinSketch) and
//! [`ExactCounter`](crate::sketches::ExactCounter) all absorb one value at a
//! time and can be queried at any point in between.

/// Single-value streaming accumulator
pub trait Accumulator {
    /// What a single ingest reports back
    type Output;
    /// Query key
    type Key: ?Sized;
    /// Query answer
    type Estimate;

    /// Absorb the next value of the stream
    fn ingest(&mut self, value: f64) -> Self::Output;

    /// Answer a query against the state accumulated so far
    fn query(&self, key: &Self::Key) -> Self::Estimate;
}

/// Bucketed frequency tables, approximate or exact
pub trait FrequencyTable: Accumulator<Output = (), Key = f64, Estimate = u64> {
    /// Values counted so far (sentinels excluded)
    fn total_count(&self) -> u64;

    /// Count of a bucket addressed by index rather than by a value inside it
    fn query_bucket(&self, bucket: usize) -> u64;

    fn is_empty(&self) -> bool {
        self.total_count() == 0
    }
}
