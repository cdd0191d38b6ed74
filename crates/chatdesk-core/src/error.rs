//! Error types for chatdesk-core

use thiserror::Error;

/// Result type alias using chatdesk-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the server client layer
    #[error(transparent)]
    Api(#[from] chatdesk_api::Error),

    /// A response is still streaming
    #[error("A response is already in progress")]
    Busy,

    /// The session flag store failed
    #[error("Session store error: {0}")]
    Store(String),

    /// A generic session error
    #[error("{0}")]
    Other(String),
}
