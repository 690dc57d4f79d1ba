use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or narrowing a sentence corpus.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed corpus json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid sentence {raw:?}: {reason}")]
    InvalidSentence { raw: String, reason: &'static str },

    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}

/// Failures while reading or writing the high-score record.
///
/// These never reach the game loop; the record store logs them and falls back.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record file io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record json: {0}")]
    Json(#[from] serde_json::Error),
}
