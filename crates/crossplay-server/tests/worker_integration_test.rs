mod common;

use assert_matches::assert_matches;
use common::*;
use crossplay_protocol::chat::TextComponent;
use crossplay_protocol::control::ControlFrame;
use crossplay_protocol::disconnect::DisconnectPacket;
use crossplay_protocol::login::{LoginStartPacket, LoginSuccessPacket};
use crossplay_protocol::packet::Packet;
use crossplay_protocol::status::{PingPacket, StatusRequestPacket, StatusResponsePacket};
use crossplay_server::config::BridgeConfig;
use futures::SinkExt;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_status_and_ping() {
    let config = BridgeConfig {
        motd: "Crossplay test".to_string(),
        max_players: 8,
        ..Default::default()
    };
    let (address, _engine, _worker) = start_worker(config).await;
    let mut client = connect(address).await;

    send_handshake(&mut client, address, 1).await;
    send_packet(&mut client, StatusRequestPacket).await;

    let (packet_id, mut buffer) = read_packet(&mut client).await.unwrap();
    assert_eq!(packet_id, 0x00);
    let response = StatusResponsePacket::read_from_buffer(&mut buffer).unwrap();
    assert_status_fields(&response.response);
    let status: serde_json::Value = serde_json::from_str(&response.response).unwrap();
    assert_eq!(status["version"]["protocol"], 340);
    assert_eq!(status["players"]["max"], 8);
    assert_eq!(status["description"]["text"], "Crossplay test");

    send_packet(&mut client, PingPacket { payload: 0x1234_5678 }).await;
    let (packet_id, mut buffer) = read_packet(&mut client).await.unwrap();
    assert_eq!(packet_id, 0x01);
    assert_eq!(PingPacket::read_from_buffer(&mut buffer).unwrap().payload, 0x1234_5678);

    // the worker closes status connections after the pong
    assert!(read_packet(&mut client).await.is_none());
}

#[tokio::test]
async fn test_login_is_forwarded() {
    let (address, mut engine, _worker) = start_worker(BridgeConfig::default()).await;
    let mut client = connect(address).await;

    send_handshake(&mut client, address, 2).await;
    let login = LoginStartPacket {
        username: "Steve".to_string(),
    };
    send_packet(&mut client, login.clone()).await;

    let session = assert_matches!(
        next_frame(&mut engine).await,
        ControlFrame::OpenSession { session, address, .. } if address == "127.0.0.1" => session
    );
    assert_eq!(
        next_frame(&mut engine).await,
        ControlFrame::SendPacket {
            session,
            packet: login.to_bytes()
        }
    );

    // engine -> client
    let success = LoginSuccessPacket::new("Steve".to_string());
    engine
        .send(ControlFrame::SendPacket {
            session,
            packet: success.to_bytes(),
        })
        .await
        .unwrap();
    let (packet_id, mut buffer) = read_packet(&mut client).await.unwrap();
    assert_eq!(packet_id, 0x02);
    assert_eq!(
        LoginSuccessPacket::read_from_buffer(&mut buffer).unwrap(),
        success
    );
}

#[tokio::test]
async fn test_client_disconnect_is_reported() {
    let (address, mut engine, _worker) = start_worker(BridgeConfig::default()).await;
    let mut client = connect(address).await;
    send_handshake(&mut client, address, 2).await;

    let session = assert_matches!(
        next_frame(&mut engine).await,
        ControlFrame::OpenSession { session, .. } => session
    );
    drop(client);

    assert_eq!(
        next_frame(&mut engine).await,
        ControlFrame::CloseSession { session }
    );
}

#[tokio::test]
async fn test_engine_close_disconnects_client() {
    let (address, mut engine, _worker) = start_worker(BridgeConfig::default()).await;
    let mut client = connect(address).await;
    send_handshake(&mut client, address, 2).await;
    let session = assert_matches!(
        next_frame(&mut engine).await,
        ControlFrame::OpenSession { session, .. } => session
    );

    let goodbye = DisconnectPacket::new(&TextComponent::plain("Kicked"));
    engine
        .send(ControlFrame::SendPacket {
            session,
            packet: goodbye.to_bytes(),
        })
        .await
        .unwrap();
    engine
        .send(ControlFrame::CloseSession { session })
        .await
        .unwrap();

    let (packet_id, _) = read_packet(&mut client).await.unwrap();
    assert_eq!(packet_id, 0x1A);
    assert!(read_packet(&mut client).await.is_none());

    // no CLOSE_SESSION echo for a session the engine closed
    assert!(timeout(Duration::from_millis(200), next_frame(&mut engine))
        .await
        .is_err());
}

#[tokio::test]
async fn test_encryption_request_closes_session() {
    let (address, mut engine, _worker) = start_worker(BridgeConfig::default()).await;
    let mut client = connect(address).await;
    send_handshake(&mut client, address, 2).await;
    let session = assert_matches!(
        next_frame(&mut engine).await,
        ControlFrame::OpenSession { session, .. } => session
    );

    engine
        .send(ControlFrame::EnableEncryption {
            session,
            secret: vec![0; 16],
        })
        .await
        .unwrap();

    assert_eq!(
        next_frame(&mut engine).await,
        ControlFrame::CloseSession { session }
    );
    assert!(read_packet(&mut client).await.is_none());
}

#[tokio::test]
async fn test_shutdown_stops_worker() {
    let (address, mut engine, worker) = start_worker(BridgeConfig::default()).await;
    let mut client = connect(address).await;
    send_handshake(&mut client, address, 2).await;
    assert_matches!(next_frame(&mut engine).await, ControlFrame::OpenSession { .. });

    engine.send(ControlFrame::Shutdown).await.unwrap();

    let result = timeout(Duration::from_secs(5), worker).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(read_packet(&mut client).await.is_none());
}

#[cfg(unix)]
#[test]
fn test_worker_thread_stops_on_shutdown() {
    use std::io::Write;

    let config = BridgeConfig {
        listen_address: "127.0.0.1:0".to_string(),
        ..Default::default()
    };
    let (mut channel, handle) = crossplay_server::worker::spawn_worker_thread(config).unwrap();
    channel.write_all(&ControlFrame::Shutdown.encode()).unwrap();

    let result = handle.join().unwrap();
    assert!(result.is_ok());
}
