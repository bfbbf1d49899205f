//! Errors produced by the fetch collaborators.
//!
//! None of these escape the aggregator: a failed fetch is logged, the busy
//! counter is corrected and the poll attempt simply yields nothing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body arrived but is not the JSON the API documents.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{source_name} responded with HTTP {status}")]
    Status { source_name: String, status: u16 },

    /// The source only makes sense for a signed-in account.
    #[error("{0} requires a signed-in user")]
    NotLoggedIn(&'static str),

    /// A source kind was routed to a client that does not serve it.
    #[error("{source_name} cannot load {key}")]
    Unsupported { source_name: String, key: String },
}

pub type Result<T> = std::result::Result<T, FetchError>;
