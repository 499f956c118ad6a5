//! Error taxonomy for the invoice pipeline.
//!
//! Classification and content errors are per-file: the run logs them, counts
//! them, and moves on to the next candidate so the file is retried on a later
//! pass. Transport and write errors abort the whole run and are surfaced to
//! whatever triggered it.

use thiserror::Error;

/// A filename could not be resolved to a format variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("no format variant matches '{0}'")]
    NoMatch(String),
    #[error("'{filename}' matches multiple format variants: {keywords:?}")]
    Ambiguous {
        filename: String,
        keywords: Vec<&'static str>,
    },
}

/// A file body could not be read as the spreadsheet format its name claims.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ContentError(pub String);

/// Failure while listing or downloading from the storage backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure talking to the backend. Aborts the run.
    #[error("{0}")]
    Transport(String),
    /// Body downloaded but unreadable as a spreadsheet. Per-file, non-fatal.
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// The destination sheet rejected or failed an append.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct WriteError(pub String);

/// The processed-set store could not be read or updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Fatal, run-level failures. The processed set is never updated for the
/// file that triggered one of these.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("folder listing failed: {0}")]
    List(String),
    #[error("file download failed: {0}")]
    Fetch(String),
    #[error("sheet append failed: {0}")]
    Write(#[from] WriteError),
    #[error("processed-set store failed: {0}")]
    Store(#[from] StoreError),
}
