use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No platform data directory available")]
    NoDataDir,
    #[error("Unknown cache backend: {0}")]
    UnknownBackend(String),
}

pub type DbResult<T> = Result<T, DbError>;
