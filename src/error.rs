//! Typed errors for the collaborator seams.
//!
//! Each seam returns its own error so callers decide recovery: a failed
//! fetch skips the cycle without touching the snapshot, a failed snapshot
//! read counts as "no prior cache", a failed write is logged and swallowed.

use thiserror::Error;

/// Errors from the spreadsheet and status-page sources.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport or non-2xx status from the Sheets API.
    #[error("http request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// The delegated scrape command could not run or exited non-zero.
    #[error("scrape command failed: {0}")]
    Command(String),

    /// The source answered, but not with the shape we expect.
    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

/// Errors from the blob store backing the snapshot.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors from outbound Telegram delivery.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Telegram answered with `ok: false`.
    #[error("telegram rejected the call: {0}")]
    Api(String),
}

impl From<ureq::Error> for NotifyError {
    fn from(err: ureq::Error) -> Self {
        NotifyError::Http(Box::new(err))
    }
}
