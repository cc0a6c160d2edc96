//! Client dispatcher.
//!
//! Orchestrates send -> register -> await-settlement for each request and
//! runs the background read loop that feeds inbound frames through the
//! codec, the classifier, and the pending-request registry.

use crate::error::ClientError;
use crate::registry::{PendingRequests, Settlement};
use crate::transport::{TcpTransport, Transport, TransportMode, UdpTransport};
use devlink_protocol::correlation::{classify, Completeness};
use devlink_protocol::{decode_datagram, encode_message, Decoder, Message};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Default read buffer size (64 KiB, one maximum-size datagram).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address.
    pub remote_addr: SocketAddr,
    /// Local bind address for datagram transports.
    pub bind_addr: SocketAddr,
    /// Default request timeout, override-able per call.
    pub request_timeout: Duration,
    /// Read buffer size for socket reads.
    pub read_buffer_size: usize,
}

impl ClientConfig {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }
}

/// Asynchronous request/response client.
///
/// Multiple `execute` calls may be in flight concurrently; each gets a
/// distinct serial and therefore a distinct correlation key, and waits
/// only on its own registry entry.
pub struct MessageClient {
    transport: Arc<dyn Transport>,
    pending: Arc<PendingRequests>,
    next_serial: AtomicI32,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl MessageClient {
    /// Connects over UDP.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = UdpTransport::connect(config.bind_addr, config.remote_addr).await?;
        Ok(Self::with_transport(&config, Arc::new(transport)))
    }

    /// Connects over TCP.
    pub async fn connect_tcp(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = TcpTransport::connect(config.remote_addr).await?;
        Ok(Self::with_transport(&config, Arc::new(transport)))
    }

    /// Builds a client over an already-established transport and spawns
    /// the background read loop. Must be called within a tokio runtime.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let pending = Arc::new(PendingRequests::new());
        let connected = Arc::new(AtomicBool::new(true));

        let read_task = tokio::spawn(Self::read_loop(
            transport.clone(),
            pending.clone(),
            connected.clone(),
            config.read_buffer_size,
        ));

        Self {
            transport,
            pending,
            next_serial: AtomicI32::new(1),
            connected,
            request_timeout: config.request_timeout,
            read_task: Mutex::new(Some(read_task)),
        }
    }

    /// Receives, decodes, classifies, and dispatches inbound frames.
    async fn read_loop(
        transport: Arc<dyn Transport>,
        pending: Arc<PendingRequests>,
        connected: Arc<AtomicBool>,
        buffer_size: usize,
    ) {
        let mut buf = vec![0u8; buffer_size];

        match transport.mode() {
            TransportMode::Datagram => loop {
                let n = match transport.recv(&mut buf).await {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!("receive failed: {}", e);
                        break;
                    }
                };
                match decode_datagram(&buf[..n]) {
                    Ok(msg) => Self::dispatch(&pending, msg),
                    Err(e) => tracing::warn!("dropping malformed datagram: {}", e),
                }
            },
            TransportMode::Stream => {
                let mut decoder = Decoder::new();
                'outer: loop {
                    let n = match transport.recv(&mut buf).await {
                        Ok(0) => {
                            tracing::debug!("peer closed the connection");
                            break;
                        }
                        Ok(n) => n,
                        Err(e) => {
                            tracing::warn!("receive failed: {}", e);
                            break;
                        }
                    };
                    decoder.extend(&buf[..n]);
                    loop {
                        match decoder.decode_message() {
                            Ok(Some(msg)) => Self::dispatch(&pending, msg),
                            Ok(None) => break,
                            Err(e) => {
                                // No resynchronization on a byte stream past
                                // a bad header; drop the connection.
                                tracing::warn!("malformed frame on stream: {}", e);
                                break 'outer;
                            }
                        }
                    }
                }
            }
        }

        connected.store(false, Ordering::SeqCst);
        pending.cancel_all();
    }

    fn dispatch(pending: &PendingRequests, msg: Message) {
        let classification = classify(&msg);
        match classification.completeness {
            Completeness::Whole => {
                pending.resolve(classification.key, msg);
            }
            Completeness::Partial | Completeness::PartialFinal => {
                // This protocol version carries whole responses only.
                tracing::debug!("ignoring partial frame for {}", classification.key);
            }
        }
    }

    /// Sends a request and waits for its response, using the configured
    /// default timeout.
    pub async fn execute(&self, message: Message) -> Result<Message, ClientError> {
        self.execute_with_timeout(message, self.request_timeout).await
    }

    /// Sends a request and waits for its response.
    ///
    /// Assigns the next serial, registers the correlation key, hands the
    /// frame to the transport, then suspends until the registry settles
    /// the entry. Concurrent calls on other keys are not blocked.
    pub async fn execute_with_timeout(
        &self,
        mut message: Message,
        timeout: Duration,
    ) -> Result<Message, ClientError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }

        message.serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        let key = message.correlation_key();

        // Encode before registering so an encoding failure leaves no
        // orphan entry and never reaches the transport.
        let encoded = encode_message(&message)?;
        let rx = self.pending.clone().register(key, timeout)?;

        tracing::debug!("sending request {} ({} bytes)", key, encoded.len());
        if let Err(e) = self.transport.send(&encoded).await {
            self.pending.cancel(key);
            return Err(ClientError::Transport(e));
        }

        match rx.await {
            Ok(Settlement::Resolved(response)) => Ok(response),
            Ok(Settlement::TimedOut) => Err(ClientError::DeviceResponseTimeout { key, timeout }),
            Ok(Settlement::Cancelled) => Err(ClientError::Cancelled),
            Err(_) => Err(ClientError::ConnectionClosed),
        }
    }

    /// Fire-and-forget send with no registry interaction; no response is
    /// expected. The message is sent as built, serial included.
    pub async fn send_one_way(&self, message: Message) -> Result<(), ClientError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        let encoded = encode_message(&message)?;
        self.transport.send(&encoded).await?;
        Ok(())
    }

    /// Returns whether the transport is still usable.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the number of in-flight requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Stops the read loop and releases every pending waiter promptly,
    /// rather than letting them run out their individual timeouts.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut task) = self.read_task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
        self.pending.cancel_all();
    }
}

impl Drop for MessageClient {
    fn drop(&mut self) {
        self.close();
    }
}
