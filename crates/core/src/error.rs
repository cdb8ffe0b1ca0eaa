use crate::domain::repo::RepoKey;
use std::path::PathBuf;
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Repository {key} already tracked")]
    DuplicateRepository { key: RepoKey },

    #[error("Invalid repository: {reason}")]
    InvalidRepository { reason: String },

    #[error("No repository at position {index}")]
    RepositoryNotFound { index: usize },

    #[error(
        "config file not found: {}\n\nCreate it with `tagwatch init`, or by hand:\n\n\
         [[repos]]\nowner = \"your-org\"\nrepo = \"your-repo\"\nnotes = \"Optional description\"",
        path.display()
    )]
    ConfigMissing { path: PathBuf },

    #[error("reading config {}: {message}", path.display())]
    ConfigRead { path: PathBuf, message: String },

    #[error("parsing config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("saving config {}: {message}", path.display())]
    ConfigPersist { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failures talking to the remote API. All of these end up as an error
/// status on the affected repository only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 404; expected for the latest-release lookup, fatal elsewhere
    #[error("not found")]
    NotFound,

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Transport(String),

    #[error("decode: {0}")]
    Decode(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
