//! Error types for the index and its collaborators.

use lsp_types::Url;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`FileProvider`](crate::files::FileProvider).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The remote side rejected or failed a request
    #[error("file request `{method}` failed: {message}")]
    Request { method: String, message: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("workspace walk failed: {0}")]
    Walk(#[from] ignore::Error),

    #[error("not a file uri: {0}")]
    InvalidUri(Url),

    #[error("file not found: {0}")]
    NotFound(Url),
}

/// Failures while resolving a cursor position. Callers degrade these to empty results.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("content unavailable for {0}")]
    ContentUnavailable(Url),

    #[error("line {line} out of range in {uri}")]
    LineOutOfRange { uri: Url, line: u32 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
