use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    Annotation {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Field {field} is not a number: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Expected {expected} synchronized streams, got {found}")]
    StreamMismatch { expected: usize, found: usize },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Attach a 1-based line number to an annotation failure raised without one
    pub fn at_line(self, line: usize) -> Self {
        match self {
            ProcessingError::Annotation {
                expected, found, ..
            } => ProcessingError::Annotation {
                line,
                expected,
                found,
            },
            other => other,
        }
    }
}
