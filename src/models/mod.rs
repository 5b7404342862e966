pub mod outputs;
pub mod record;

pub use outputs::{BucketCount, OutlierFlag, StationMax, WindowMean};
pub use record::{Clock, Field, RecordAnnotator, StationRecord};
