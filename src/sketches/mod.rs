//! Bucketed frequency counting: Count-Min Sketch and its exact reference
//!
//! Both tables share one [`Bucketing`] so their answers are comparable
//! bucket by bucket; the sketch never reports less than the exact count.

pub mod bucketing;
pub mod count_min;
pub mod exact;
pub mod sharded;

pub use bucketing::{BucketKey, Bucketing};
pub use count_min::{default_seeds, CountMinSketch};
pub use exact::ExactCounter;
pub use sharded::{Shardable, ShardedIngest};
