pub mod csv_writer;
pub mod summary_writer;

pub use csv_writer::{open_destination, ResultWriter};
pub use summary_writer::write_summary_json;
