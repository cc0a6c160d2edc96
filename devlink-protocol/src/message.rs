//! The protocol envelope.

use crate::correlation::CorrelationKey;
use std::fmt;

/// A DMP message: the single envelope type carried on the wire.
///
/// The same shape serves as request and response; a response echoes the
/// request's `session_id` and `serial`, which is how the two are matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifies a logical client/session.
    pub session_id: i32,
    /// Per-client sequence number disambiguating concurrent requests.
    pub serial: i32,
    /// Declared byte length of `content` on the wire. Content shorter than
    /// this is zero-padded on encode.
    pub content_length: i32,
    /// Message content, interpreted as text. Unset content fails encode.
    pub content: Option<String>,
}

impl Message {
    /// Creates a message with `content_length` derived from the content's
    /// UTF-8 byte length. The serial is assigned by the client dispatcher
    /// at send time; use [`with_serial`](Self::with_serial) to set it
    /// explicitly.
    pub fn new(session_id: i32, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            session_id,
            serial: 0,
            content_length: content.len() as i32,
            content: Some(content),
        }
    }

    /// Sets the serial number.
    pub fn with_serial(mut self, serial: i32) -> Self {
        self.serial = serial;
        self
    }

    /// Overrides the declared content length. Declaring more than the
    /// content's byte length pads the frame with zero bytes on encode;
    /// declaring less fails encode.
    pub fn with_content_length(mut self, content_length: i32) -> Self {
        self.content_length = content_length;
        self
    }

    /// Derives the correlation key matching this message to its
    /// counterpart.
    pub fn correlation_key(&self) -> CorrelationKey {
        CorrelationKey::new(self.session_id, self.serial)
    }

    /// Content with trailing zero-padding stripped. Decoded messages carry
    /// the padding bytes the encoder added; this recovers the original
    /// text.
    pub fn content_trimmed(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(|c| c.trim_end_matches('\0'))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message{{session_id={}, serial={}, content_length={}, content={:?}}}",
            self.session_id,
            self.serial,
            self.content_length,
            self.content_trimmed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_content_length() {
        let msg = Message::new(1, "hello");
        assert_eq!(msg.content_length, 5);
        assert_eq!(msg.serial, 0);
        assert_eq!(msg.content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_builders() {
        let msg = Message::new(7, "ab").with_serial(42).with_content_length(8);
        assert_eq!(msg.serial, 42);
        assert_eq!(msg.content_length, 8);
    }

    #[test]
    fn test_correlation_key_matches_fields() {
        let msg = Message::new(10000, "test1").with_serial(1);
        assert_eq!(msg.correlation_key(), CorrelationKey::new(10000, 1));
    }

    #[test]
    fn test_content_trimmed_strips_padding() {
        let mut msg = Message::new(1, "hi");
        msg.content = Some("hi\0\0\0".to_string());
        assert_eq!(msg.content_trimmed(), Some("hi"));
    }

    #[test]
    fn test_display_uses_trimmed_content() {
        let mut msg = Message::new(2, "ok").with_serial(3);
        msg.content = Some("ok\0".to_string());
        let text = msg.to_string();
        assert!(text.contains("session_id=2"));
        assert!(text.contains("serial=3"));
        assert!(!text.contains('\0'));
    }
}
