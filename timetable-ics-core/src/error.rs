use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("ICS generation failed: {0}")]
    IcsGeneration(String),

    #[error("No wall-clock time configured for period {0}")]
    UnknownPeriod(u8),

    #[error("Calendar link generation failed: {0}")]
    LinkGeneration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
