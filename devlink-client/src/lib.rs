//! # devlink-client
//!
//! Client library for devlink.
//!
//! This crate provides:
//! - A pending-request registry with exactly-once settlement and timeout
//!   eviction
//! - Datagram and stream transports behind a common trait
//! - An async dispatcher exposing request/response as a single call

pub mod client;
pub mod error;
pub mod registry;
pub mod transport;

pub use client::{ClientConfig, MessageClient};
pub use error::ClientError;
pub use registry::{PendingRequests, Settlement};
pub use transport::{TcpTransport, Transport, TransportMode, UdpTransport};
