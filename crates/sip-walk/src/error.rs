use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("invalid ignore pattern: {0}")]
    Pattern(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk worker panicked")]
    WorkerPanicked,
}

pub type WalkResult<T> = Result<T, WalkError>;
