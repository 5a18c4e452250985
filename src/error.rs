use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors raised while crawling and writing the dataset
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tree listing for {repo} has no entries")]
    MissingTree { repo: String },

    #[error("invalid API url {0}")]
    InvalidUrl(String),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write record {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HarvestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
