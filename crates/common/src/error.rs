use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Duplicate space slug: {0}")]
    DuplicateSpace(String),

    #[error("Invalid space configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
