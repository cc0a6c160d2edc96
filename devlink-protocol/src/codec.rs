//! Encoder and incremental decoder for stream transports.
//!
//! Datagram transports decode with [`decode_datagram`](crate::frame::decode_datagram)
//! directly, one frame per buffer. Stream transports deliver arbitrary
//! chunks, so the [`Decoder`] buffers bytes until a whole frame is
//! available.

use crate::error::{EncodingError, FramingError};
use crate::frame::{self, HEADER_SIZE};
use crate::message::Message;
use bytes::BytesMut;

/// Encodes messages into frames.
pub struct Encoder;

impl Encoder {
    /// Encodes a message into a frame.
    pub fn encode(msg: &Message) -> Result<BytesMut, EncodingError> {
        frame::encode_message(msg)
    }
}

/// Incremental decoder for stream transports.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next message from the buffer.
    ///
    /// Returns `Ok(Some(message))` if a complete frame was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on a malformed header.
    /// A framing error leaves the buffer unconsumed; on a byte stream
    /// there is no way to resynchronize past a bad header, so callers
    /// should drop the connection.
    pub fn decode_message(&mut self) -> Result<Option<Message>, FramingError> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        // Peek the declared length without consuming the header.
        let content_length =
            i32::from_be_bytes([self.buffer[8], self.buffer[9], self.buffer[10], self.buffer[11]]);
        if content_length <= 0 {
            return Err(FramingError::NonPositiveContentLength(content_length));
        }

        let total = HEADER_SIZE + content_length as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let frame = self.buffer.split_to(total);
        frame::decode_datagram(&frame).map(Some)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
