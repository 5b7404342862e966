pub mod constants;
pub mod datetime;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use datetime::{format_timestamp, to_timestamp};
pub use filename::default_output_path;
pub use progress::ProgressReporter;
