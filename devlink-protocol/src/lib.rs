//! # devlink-protocol
//!
//! Wire protocol implementation for devlink (DMP - device message protocol).
//!
//! This crate provides:
//! - Binary framing with a fixed 12-byte header and zero-padded content
//! - Correlation keys derived from `(session_id, serial)`
//! - Response classification (whole vs. partial responses)
//! - Framing and encoding error types

pub mod codec;
pub mod correlation;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{Decoder, Encoder};
pub use correlation::{classify, Classification, Completeness, CorrelationKey};
pub use error::{EncodingError, FramingError};
pub use frame::{decode_datagram, encode_message, HEADER_SIZE};
pub use message::Message;

/// Default port for the devlink echo server.
pub const DEFAULT_PORT: u16 = 4999;
