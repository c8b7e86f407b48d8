use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("invalid batch: batch_size {batch_size} must be in 1..={split_size}")]
    InvalidBatch { batch_size: usize, split_size: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
