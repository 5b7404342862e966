use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

use crate::analyzers::Task;
use crate::utils::constants::OUTPUT_DIR;

/// Default CSV path for a task: output/{input-stem}-{task}-{YYMMDD}.csv
pub fn default_output_path(task: Task, input: &Path) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stream".to_string());

    let filename = format!(
        "{}-{}-{:02}{:02}{:02}.csv",
        stem,
        task,
        year,
        now.month(),
        now.day()
    );
    PathBuf::from(OUTPUT_DIR).join(filename)
}
