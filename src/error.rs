use std::path::PathBuf;
use thiserror::Error;

/// A request/response pair missing a field the HAR schema cannot do without.
///
/// Malformed headers and cookies are skipped silently; only a missing
/// method, URL, or status code aborts entry construction.
#[derive(Debug, Error)]
pub enum MalformedExchange {
    #[error("request has no method")]
    MissingMethod,
    #[error("{method} request has no URL")]
    MissingUrl { method: String },
    #[error("response for {url} has no status code")]
    MissingStatus { url: String },
}

/// Failure to serialize or write the HAR document. Never retried internally.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize HAR document")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for the recording session wrapper
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Malformed(#[from] MalformedExchange),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("transport error")]
    Transport(#[from] reqwest::Error),
}
