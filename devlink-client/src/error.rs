//! Client error types.

use devlink_protocol::{CorrelationKey, EncodingError};
use std::time::Duration;
use thiserror::Error;

/// Client errors. Every failure is scoped to a single request; none is
/// fatal to the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("correlation key {0} is already pending")]
    DuplicateKey(CorrelationKey),

    #[error("no response for {key} within {timeout:?}")]
    DeviceResponseTimeout {
        key: CorrelationKey,
        timeout: Duration,
    },

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Returns whether this error is potentially retryable with a fresh
    /// serial.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::DeviceResponseTimeout { .. }
                | ClientError::Transport(_)
                | ClientError::DuplicateKey(_)
        )
    }
}
