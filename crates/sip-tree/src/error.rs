use std::path::PathBuf;

use sip_types::RuleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("path not found in tree: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("path already mapped by rule {owner}: {}", .path.display())]
    AlreadyMapped { path: PathBuf, owner: RuleId },
}

pub type TreeResult<T> = Result<T, TreeError>;
