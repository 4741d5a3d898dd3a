use std::time::Duration;

use thiserror::Error;

/// Sign-in / sign-out failures reported by the auth gateway.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The gateway refused the credentials; the message is user-facing.
    #[error("{0}")]
    Rejected(String),

    #[error("auth service unreachable: {0}")]
    Transport(String),

    #[error("auth service returned {status}: {body}")]
    Unexpected { status: u16, body: String },
}

/// Failures talking to the order data source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("order query failed: {0}")]
    Transport(String),

    #[error("order query returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode orders: {0}")]
    Decode(String),

    #[error("order query timed out after {0:?}")]
    Timeout(Duration),

    #[error("change subscription failed: {0}")]
    Subscribe(String),
}
