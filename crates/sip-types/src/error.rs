use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
