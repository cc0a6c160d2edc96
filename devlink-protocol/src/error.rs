//! Protocol error types.

use thiserror::Error;

/// Errors raised while serializing an outbound [`Message`](crate::Message).
///
/// An encoding failure happens before any transport interaction; the send
/// is never attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("message content is unset")]
    MissingContent,

    #[error("declared content length {0} is negative")]
    NegativeContentLength(i32),

    #[error("content is {actual} bytes but declared length is {declared}")]
    ContentOverflow { declared: i32, actual: usize },
}

/// Errors raised while parsing inbound bytes into a [`Message`](crate::Message).
///
/// A malformed frame is dropped by the receiver; it never reaches the
/// pending-request registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("frame is {len} bytes, shorter than the {header} byte header")]
    Undersized { len: usize, header: usize },

    #[error("declared content length {0} is not positive")]
    NonPositiveContentLength(i32),

    #[error("declared content length {declared} exceeds {available} available bytes")]
    Truncated { declared: usize, available: usize },

    #[error("content is not valid UTF-8")]
    InvalidUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_display() {
        let err = EncodingError::MissingContent;
        assert!(err.to_string().contains("unset"));

        let err = EncodingError::NegativeContentLength(-3);
        assert!(err.to_string().contains("-3"));

        let err = EncodingError::ContentOverflow {
            declared: 4,
            actual: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains('4') && msg.contains('9'));
    }

    #[test]
    fn test_framing_error_display() {
        let err = FramingError::Undersized { len: 7, header: 12 };
        assert!(err.to_string().contains('7'));

        let err = FramingError::NonPositiveContentLength(0);
        assert!(err.to_string().contains("not positive"));

        let err = FramingError::Truncated {
            declared: 100,
            available: 5,
        };
        assert!(err.to_string().contains("100"));

        let err = FramingError::InvalidUtf8;
        assert!(err.to_string().contains("UTF-8"));
    }
}
