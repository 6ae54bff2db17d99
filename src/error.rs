use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("setting `{setting}` not found in {path}", setting = .0, path = .1.display())]
    MissingSetting(String, PathBuf),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("invalid year range: {0}")]
    InvalidYearRange(String),

    #[error("invalid calendar month: {0}")]
    InvalidMonth(String),

    #[error("missing CDS credentials: {0}")]
    MissingCredentials(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("retrieval failed: {0}")]
    Retrieval(String),
}
