pub mod stream_analyzer;
pub mod summary;

pub use stream_analyzer::StreamAnalyzer;
pub use summary::{RunSummary, Task};
