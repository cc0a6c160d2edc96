//! Correlation keys and response classification.

use crate::message::Message;
use std::fmt;

/// Identifier linking a request to its eventual response.
///
/// Derived from `(session_id, serial)`; both fields participate in
/// equality and hashing, in order, so swapping them yields a different
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey {
    session_id: i32,
    serial: i32,
}

impl CorrelationKey {
    /// Derives the key for a `(session_id, serial)` pair. Pure and
    /// deterministic; equal pairs always produce equal keys.
    pub fn new(session_id: i32, serial: i32) -> Self {
        Self { session_id, serial }
    }

    pub fn session_id(&self) -> i32 {
        self.session_id
    }

    pub fn serial(&self) -> i32 {
        self.serial
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session_id, self.serial)
    }
}

/// Whether an inbound frame carries a whole response or part of one.
///
/// This protocol version always delivers whole responses; the partial
/// variants exist so a future streamed-response protocol can classify
/// without changing the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// The frame is a complete response.
    Whole,
    /// The frame is one part of a multi-frame response.
    Partial,
    /// The frame is the final part of a multi-frame response.
    PartialFinal,
}

/// Result of classifying an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub key: CorrelationKey,
    pub completeness: Completeness,
}

/// Classifies a decoded inbound message.
///
/// Never fails: malformed frames are rejected by the codec before they
/// reach classification. Whether the key completes a pending request is
/// the registry's call, not the classifier's.
pub fn classify(msg: &Message) -> Classification {
    Classification {
        key: msg.correlation_key(),
        completeness: Completeness::Whole,
    }
}
