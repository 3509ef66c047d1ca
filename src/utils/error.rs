//! The `error` module defines the error types returned by the dispatcher.
//!
//! Subscribing without a callback is the only validation failure. Everything
//! else a caller can get back is an error raised by one of its own callbacks
//! during a publish, wrapped with the subscription it came from.

use thiserror::Error;

use crate::dispatcher::Token;

/// Error type callbacks return. Any `std::error::Error` converts into it with `?`.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("subscription to topic '{topic}' has no callback")]
    InvalidCallback { topic: String },

    #[error("callback for subscription {token} on topic '{topic}' failed: {source}")]
    Callback {
        topic: String,
        token: Token,
        #[source]
        source: CallbackError,
    },
}

/// A string that is not the exact rendering of a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a subscription token")]
pub struct InvalidToken(pub String);
