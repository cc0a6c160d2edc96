//! Transport collaborators.
//!
//! The core never assumes a particular I/O model; it only needs a way to
//! hand raw frames to the wire and to pull raw bytes back. Datagram
//! transports deliver one frame per receive, stream transports deliver
//! arbitrary chunks, and the dispatcher's read loop picks the matching
//! decode strategy from [`Transport::mode`].

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;

/// Framing discipline of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Each receive yields exactly one whole frame.
    Datagram,
    /// Receives yield arbitrary byte chunks; frames need reassembly.
    Stream,
}

/// Raw byte transport between client and server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Framing discipline of this transport.
    fn mode(&self) -> TransportMode;

    /// Sends one encoded frame.
    async fn send(&self, frame: &[u8]) -> io::Result<()>;

    /// Receives raw bytes into `buf`, returning the number of bytes read.
    /// For stream transports, 0 means the peer closed the connection.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Connected UDP transport.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a local socket and connects it to the remote address, so
    /// stray datagrams from other peers are filtered by the kernel.
    pub async fn connect(bind_addr: SocketAddr, remote_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(remote_addr).await?;
        tracing::debug!(
            "udp transport {} -> {}",
            socket.local_addr()?,
            remote_addr
        );
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Datagram
    }

    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(frame).await?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram send: {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }
}

/// TCP stream transport.
pub struct TcpTransport {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpTransport {
    pub async fn connect(remote_addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(remote_addr).await?;
        stream.set_nodelay(true).ok();
        tracing::debug!("tcp transport {} -> {}", stream.local_addr()?, remote_addr);
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Stream
    }

    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().await.read(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_send_recv_roundtrip() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let transport = UdpTransport::connect("127.0.0.1:0".parse().unwrap(), peer_addr)
            .await
            .unwrap();

        transport.send(b"hello").await.unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert_eq!(from, transport.local_addr().unwrap());

        peer.send_to(b"world", from).await.unwrap();
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(transport.mode(), TransportMode::Datagram);
    }

    #[tokio::test]
    async fn test_tcp_send_recv_roundtrip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(&buf[..n]).await.unwrap();
        });

        let transport = TcpTransport::connect(addr).await.unwrap();
        assert_eq!(transport.mode(), TransportMode::Stream);

        transport.send(b"echo me").await.unwrap();
        let mut buf = [0u8; 64];
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"echo me");

        accept.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_recv_zero_on_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let transport = TcpTransport::connect(addr).await.unwrap();
        accept.await.unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(transport.recv(&mut buf).await.unwrap(), 0);
    }
}
