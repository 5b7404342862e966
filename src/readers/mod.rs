pub mod record_reader;
pub mod synchronized_reader;

pub use record_reader::{RecordIterator, RecordReader};
pub use synchronized_reader::SynchronizedReader;
