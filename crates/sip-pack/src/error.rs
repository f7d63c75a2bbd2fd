use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("cannot use output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read source file {}: {source}", .path.display())]
    SourceFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unknown package format: {0}")]
    UnknownFormat(String),

    #[error("metadata {id} failed validation: {diagnostic}")]
    InvalidMetadata { id: String, diagnostic: String },

    #[error("export worker panicked")]
    WorkerPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type PackResult<T> = Result<T, PackError>;
