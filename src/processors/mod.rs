pub mod index_max;
pub mod outliers;
pub mod running_stats;
pub mod window;
pub mod windowed_mean;

pub use index_max::MultiStreamArgMax;
pub use outliers::OutlierDetector;
pub use running_stats::{MeanStd, RunningStats};
pub use window::{WindowBuffer, WindowSpec};
pub use windowed_mean::WindowedMean;
