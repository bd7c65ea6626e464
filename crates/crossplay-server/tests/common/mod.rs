use crossplay_common::CrossplayError;
use crossplay_protocol::codec::{ControlCodec, DesktopPacketCodec};
use crossplay_protocol::control::ControlFrame;
use crossplay_protocol::desktop::open_packet;
use crossplay_protocol::handshake::HandshakePacket;
use crossplay_protocol::packet::{Packet, PacketBuffer};
use crossplay_server::config::BridgeConfig;
use crossplay_server::worker::run_worker;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::Framed;

pub type Client = Framed<TcpStream, DesktopPacketCodec>;
pub type Engine = Framed<DuplexStream, ControlCodec>;

const WAIT: Duration = Duration::from_secs(5);

/// Starts a worker on a loopback port. The returned `Engine` is the engine
/// side of its control channel.
pub async fn start_worker(
    config: BridgeConfig,
) -> (SocketAddr, Engine, JoinHandle<Result<(), CrossplayError>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (engine_end, worker_end) = tokio::io::duplex(64 * 1024);
    let worker = tokio::spawn(run_worker(config, listener, worker_end));
    (address, Framed::new(engine_end, ControlCodec::default()), worker)
}

pub async fn connect(address: SocketAddr) -> Client {
    Framed::new(
        TcpStream::connect(address).await.unwrap(),
        DesktopPacketCodec,
    )
}

pub async fn send_handshake(client: &mut Client, address: SocketAddr, next_state: i32) {
    let handshake = HandshakePacket {
        protocol_version: 340,
        server_address: address.ip().to_string(),
        server_port: address.port(),
        next_state,
    };
    send_packet(client, handshake).await;
}

pub async fn send_packet<T: Packet>(client: &mut Client, packet: T) {
    client.send(packet.to_bytes()).await.unwrap();
}

/// Next packet from the worker, split into id and body.
pub async fn read_packet(client: &mut Client) -> Option<(i32, PacketBuffer)> {
    let bytes = timeout(WAIT, client.next())
        .await
        .expect("timed out waiting for a packet")?
        .unwrap();
    Some(open_packet(&bytes).unwrap())
}

pub async fn next_frame(engine: &mut Engine) -> ControlFrame {
    timeout(WAIT, engine.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("control channel closed")
        .unwrap()
}

pub fn assert_status_fields(json: &str) {
    let status: serde_json::Value = serde_json::from_str(json).unwrap();
    assert!(status.get("version").is_some(), "Response missing version field");
    assert!(status.get("players").is_some(), "Response missing players field");
    assert!(
        status.get("description").is_some(),
        "Response missing description field"
    );
}
