//! devlink - correlated request/response messaging over UDP or TCP.
//!
//! Provides an echo server (`serve`) and a request-loop client (`send`)
//! for exercising the protocol end to end.

use clap::{Parser, Subcommand, ValueEnum};
use devlink_client::{ClientConfig, MessageClient};
use devlink_protocol::{decode_datagram, encode_message, Decoder, Message, DEFAULT_PORT};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devlink")]
#[command(about = "Correlated request/response messaging over UDP or TCP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    Udp,
    Tcp,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the echo server
    Serve {
        /// Bind address
        #[arg(short, long, env = "DEVLINK_ADDR", default_value_t = default_addr())]
        addr: SocketAddr,

        /// Transport to serve on
        #[arg(short, long, value_enum, default_value = "udp")]
        transport: TransportKind,
    },

    /// Send a loop of requests and print the responses
    Send {
        /// Server address
        #[arg(short, long, env = "DEVLINK_ADDR", default_value_t = default_addr())]
        addr: SocketAddr,

        /// Transport to connect with
        #[arg(short, long, value_enum, default_value = "udp")]
        transport: TransportKind,

        /// Session identifier
        #[arg(short, long, default_value_t = 10000)]
        session_id: i32,

        /// Number of requests to send
        #[arg(short, long, default_value_t = 10)]
        count: u32,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
    },
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { addr, transport } => match transport {
            TransportKind::Udp => serve_udp(addr).await,
            TransportKind::Tcp => serve_tcp(addr).await,
        },
        Commands::Send {
            addr,
            transport,
            session_id,
            count,
            timeout_ms,
        } => send_loop(addr, transport, session_id, count, timeout_ms).await,
    }
}

fn reply_to(request: &Message) -> Message {
    let content = request.content_trimmed().unwrap_or_default();
    Message::new(request.session_id, format!("server reply {}", content))
        .with_serial(request.serial)
}

async fn serve_udp(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind(addr).await?;
    tracing::info!("devlink echo server listening on udp://{}", socket.local_addr()?);

    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        match decode_datagram(&buf[..n]) {
            Ok(request) => {
                tracing::debug!("request from {}: {}", from, request);
                match encode_message(&reply_to(&request)) {
                    Ok(encoded) => {
                        socket.send_to(&encoded, from).await?;
                    }
                    Err(e) => tracing::error!("failed to encode reply: {}", e),
                }
            }
            Err(e) => tracing::warn!("dropping malformed datagram from {}: {}", from, e),
        }
    }
}

async fn serve_tcp(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("devlink echo server listening on tcp://{}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::debug!("connection from {}", peer);
        tokio::spawn(async move {
            if let Err(e) = serve_tcp_conn(stream).await {
                tracing::warn!("connection {} closed: {}", peer, e);
            }
        });
    }
}

async fn serve_tcp_conn(mut stream: TcpStream) -> Result<(), Box<dyn std::error::Error>> {
    stream.set_nodelay(true).ok();
    let mut decoder = Decoder::new();
    let mut buf = vec![0u8; 8192];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        decoder.extend(&buf[..n]);
        while let Some(request) = decoder.decode_message()? {
            tracing::debug!("request: {}", request);
            let encoded = encode_message(&reply_to(&request))?;
            stream.write_all(&encoded).await?;
        }
    }
}

async fn send_loop(
    addr: SocketAddr,
    transport: TransportKind,
    session_id: i32,
    count: u32,
    timeout_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::new(addr)
        .with_request_timeout(Duration::from_millis(timeout_ms));
    let client = match transport {
        TransportKind::Udp => MessageClient::connect(config).await?,
        TransportKind::Tcp => MessageClient::connect_tcp(config).await?,
    };

    for i in 1..=count {
        let request = Message::new(session_id, format!("test{}", i));
        match client.execute(request).await {
            Ok(response) => println!("{}", response),
            Err(e) => tracing::error!("request {} failed: {}", i, e),
        }
    }

    client.close();
    Ok(())
}
