//! Binary frame format for DMP.
//!
//! Frame layout (12-byte header + content):
//!
//! ```text
//! +------------+--------+----------------+------------------------+
//! | session_id | serial | content_length | content                |
//! |  4 bytes   | 4 bytes|    4 bytes     | content_length bytes   |
//! +------------+--------+----------------+------------------------+
//! ```
//!
//! All header fields are big-endian signed 32-bit integers. Content
//! shorter than the declared length is zero-padded on encode; a declared
//! length larger than the remaining bytes fails decode.

use crate::error::{EncodingError, FramingError};
use crate::message::Message;
use bytes::{Buf, BufMut, BytesMut};

/// Size of the fixed frame header in bytes (4+4+4 = 12).
pub const HEADER_SIZE: usize = 12;

/// Encodes a message into a single frame.
///
/// Fails if the content is unset, the declared length is negative, or the
/// content is longer than the declared length. The last case is rejected
/// rather than silently producing a frame longer than its declaration.
pub fn encode_message(msg: &Message) -> Result<BytesMut, EncodingError> {
    let content = msg.content.as_deref().ok_or(EncodingError::MissingContent)?;
    let declared = usize::try_from(msg.content_length)
        .map_err(|_| EncodingError::NegativeContentLength(msg.content_length))?;

    let bytes = content.as_bytes();
    if bytes.len() > declared {
        return Err(EncodingError::ContentOverflow {
            declared: msg.content_length,
            actual: bytes.len(),
        });
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + declared);
    buf.put_i32(msg.session_id);
    buf.put_i32(msg.serial);
    buf.put_i32(msg.content_length);
    buf.put_slice(bytes);
    buf.put_bytes(0, declared - bytes.len());
    Ok(buf)
}

/// Decodes one whole frame from a datagram.
///
/// Datagram transports deliver exactly one frame per buffer, so anything
/// short of a complete frame is malformed rather than "more data needed".
pub fn decode_datagram(buf: &[u8]) -> Result<Message, FramingError> {
    if buf.len() < HEADER_SIZE {
        return Err(FramingError::Undersized {
            len: buf.len(),
            header: HEADER_SIZE,
        });
    }

    let mut cursor = buf;
    let session_id = cursor.get_i32();
    let serial = cursor.get_i32();
    let content_length = cursor.get_i32();

    if content_length <= 0 {
        return Err(FramingError::NonPositiveContentLength(content_length));
    }

    let declared = content_length as usize;
    if cursor.remaining() < declared {
        return Err(FramingError::Truncated {
            declared,
            available: cursor.remaining(),
        });
    }

    let content = std::str::from_utf8(&cursor[..declared])
        .map_err(|_| FramingError::InvalidUtf8)?
        .to_string();

    Ok(Message {
        session_id,
        serial,
        content_length,
        content: Some(content),
    })
}
