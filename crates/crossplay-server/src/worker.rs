use crate::config::BridgeConfig;
use crossplay_common::{CrossplayError, SessionId};
use crossplay_protocol::chat::TextComponent;
use crossplay_protocol::codec::{ControlCodec, DesktopPacketCodec};
use crossplay_protocol::control::ControlFrame;
use crossplay_protocol::desktop::open_packet;
use crossplay_protocol::handshake::{HandshakePacket, NextState};
use crossplay_protocol::status::{
    PingPacket, ServerStatus, StatusPlayers, StatusResponsePacket, StatusVersion,
};
use crossplay_protocol::{FrameError, Packet};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

pub const PROTOCOL_VERSION: i32 = 340;
pub const VERSION_NAME: &str = "1.12.2";

/// Worker loop -> client task.
#[derive(Debug)]
enum ClientCommand {
    Send(Vec<u8>),
    Disconnect,
}

/// Client task -> worker loop.
#[derive(Debug)]
enum WorkerEvent {
    Opened {
        session: SessionId,
        address: String,
        port: u16,
        commands: mpsc::UnboundedSender<ClientCommand>,
    },
    Packet {
        session: SessionId,
        bytes: Vec<u8>,
    },
    Closed {
        session: SessionId,
    },
}

/// State shared by every client task.
struct WorkerContext {
    config: BridgeConfig,
    next_session: AtomicI32,
    online: AtomicU32,
}

impl WorkerContext {
    fn new(config: BridgeConfig) -> Self {
        WorkerContext {
            config,
            next_session: AtomicI32::new(1),
            online: AtomicU32::new(0),
        }
    }

    fn allocate_session(&self) -> SessionId {
        SessionId(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    fn status(&self) -> ServerStatus {
        ServerStatus {
            version: StatusVersion {
                name: VERSION_NAME.to_string(),
                protocol: PROTOCOL_VERSION,
            },
            players: StatusPlayers {
                max: self.config.max_players,
                online: self.online.load(Ordering::Relaxed),
            },
            description: TextComponent::plain(self.config.motd.as_str()),
        }
    }
}

/// Binds the Desktop listener on the configured address.
pub async fn bind_listener(config: &BridgeConfig) -> Result<TcpListener, CrossplayError> {
    let listener = TcpListener::bind(&config.listen_address).await?;
    Ok(listener)
}

/// Runs the worker until the engine shuts it down or closes the channel.
pub async fn run_worker<T>(
    config: BridgeConfig,
    listener: TcpListener,
    control: T,
) -> Result<(), CrossplayError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let context = Arc::new(WorkerContext::new(config));
    let codec = ControlCodec::new(context.config.max_frame_length);
    let (mut engine_out, mut engine_in) = Framed::new(control, codec).split();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut clients: HashMap<SessionId, mpsc::UnboundedSender<ClientCommand>> = HashMap::new();

    if let Ok(address) = listener.local_addr() {
        info!(%address, "listening for desktop clients");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, address) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                debug!(%address, "client connected");
                let context = Arc::clone(&context);
                let events = events_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(context, socket, address, events).await {
                        debug!(%address, error = %e, "client connection ended with error");
                    }
                });
            }
            Some(event) = events_rx.recv() => {
                let frame = match event {
                    WorkerEvent::Opened { session, address, port, commands } => {
                        clients.insert(session, commands);
                        ControlFrame::OpenSession { session, address, port }
                    }
                    WorkerEvent::Packet { session, bytes } => {
                        if !clients.contains_key(&session) {
                            continue;
                        }
                        ControlFrame::SendPacket { session, packet: bytes }
                    }
                    WorkerEvent::Closed { session } => {
                        // already gone if the engine closed it
                        if clients.remove(&session).is_none() {
                            continue;
                        }
                        ControlFrame::CloseSession { session }
                    }
                };
                engine_out.send(frame).await?;
            }
            frame = engine_in.next() => {
                let frame = match frame {
                    Some(frame) => frame?,
                    None => {
                        info!("engine closed the control channel");
                        break;
                    }
                };
                let kind = frame.kind();
                trace!(%kind, session = ?frame.session(), "engine frame");
                match frame {
                    ControlFrame::SendPacket { session, packet } => match clients.get(&session) {
                        Some(client) => {
                            if client.send(ClientCommand::Send(packet)).is_err() {
                                debug!(session = %session, "client task already finished");
                            }
                        }
                        None => debug!(session = %session, "packet for unknown session dropped"),
                    },
                    ControlFrame::CloseSession { session } => {
                        if let Some(client) = clients.remove(&session) {
                            let _ = client.send(ClientCommand::Disconnect);
                        }
                    }
                    ControlFrame::EnableEncryption { session, .. } => {
                        if let Some(client) = clients.remove(&session) {
                            warn!(session = %session, "encryption is not supported, disconnecting");
                            let _ = client.send(ClientCommand::Disconnect);
                            engine_out.send(ControlFrame::CloseSession { session }).await?;
                        }
                    }
                    ControlFrame::OpenSession { session, .. } => {
                        warn!(session = %session, "engine sent OPEN_SESSION, ignoring");
                    }
                    ControlFrame::Shutdown | ControlFrame::EmergencyShutdown => {
                        info!(%kind, clients = clients.len(), "engine requested shutdown");
                        break;
                    }
                }
            }
        }
    }

    for (_, client) in clients.drain() {
        let _ = client.send(ClientCommand::Disconnect);
    }
    Ok(())
}

async fn handle_client(
    context: Arc<WorkerContext>,
    socket: TcpStream,
    address: SocketAddr,
    events: mpsc::UnboundedSender<WorkerEvent>,
) -> Result<(), CrossplayError> {
    let mut framed = Framed::new(socket, DesktopPacketCodec);
    let bytes = match framed.next().await {
        Some(bytes) => bytes?,
        None => return Ok(()),
    };
    let (packet_id, mut buffer) = open_packet(&bytes).map_err(FrameError::from)?;
    if packet_id != HandshakePacket::packet_id() {
        return Err(CrossplayError::ProtocolError(format!(
            "expected handshake, got packet {}",
            packet_id
        )));
    }
    let handshake = HandshakePacket::read_from_buffer(&mut buffer).map_err(FrameError::from)?;
    debug!(%address, ?handshake, "handshake");

    match NextState::from_id(handshake.next_state) {
        Some(NextState::Status) => serve_status(&context, &mut framed).await,
        Some(NextState::Login) => relay_session(&context, framed, address, events).await,
        None => {
            debug!(%address, next_state = handshake.next_state, "invalid next state, dropping");
            Ok(())
        }
    }
}

/// Answers the status request and the ping, then returns to close.
async fn serve_status(
    context: &WorkerContext,
    framed: &mut Framed<TcpStream, DesktopPacketCodec>,
) -> Result<(), CrossplayError> {
    while let Some(bytes) = framed.next().await {
        let bytes = bytes?;
        let (packet_id, mut buffer) = open_packet(&bytes).map_err(FrameError::from)?;
        match packet_id {
            0x00 => {
                let response = StatusResponsePacket::new(&context.status());
                framed.send(response.to_bytes()).await?;
            }
            0x01 => {
                let ping = PingPacket::read_from_buffer(&mut buffer).map_err(FrameError::from)?;
                framed.send(ping.to_bytes()).await?;
                return Ok(());
            }
            other => trace!(packet_id = other, "ignoring status packet"),
        }
    }
    Ok(())
}

/// Relays a logged-in client until either side closes.
async fn relay_session(
    context: &WorkerContext,
    framed: Framed<TcpStream, DesktopPacketCodec>,
    address: SocketAddr,
    events: mpsc::UnboundedSender<WorkerEvent>,
) -> Result<(), CrossplayError> {
    let session = context.allocate_session();
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
    let opened = WorkerEvent::Opened {
        session,
        address: address.ip().to_string(),
        port: address.port(),
        commands: commands_tx,
    };
    if events.send(opened).is_err() {
        return Ok(());
    }
    context.online.fetch_add(1, Ordering::Relaxed);
    info!(session = %session, %address, "session opened");

    let (mut client_out, mut client_in) = framed.split();
    let result = loop {
        tokio::select! {
            packet = client_in.next() => match packet {
                Some(Ok(bytes)) => {
                    if events.send(WorkerEvent::Packet { session, bytes }).is_err() {
                        break Ok(());
                    }
                }
                Some(Err(e)) => break Err(CrossplayError::from(e)),
                None => break Ok(()),
            },
            command = commands_rx.recv() => match command {
                Some(ClientCommand::Send(bytes)) => {
                    if let Err(e) = client_out.send(bytes).await {
                        break Err(CrossplayError::from(e));
                    }
                }
                Some(ClientCommand::Disconnect) | None => break Ok(()),
            },
        }
    };

    context.online.fetch_sub(1, Ordering::Relaxed);
    info!(session = %session, "session closed");
    let _ = events.send(WorkerEvent::Closed { session });
    result
}

/// Starts the worker on its own thread and runtime, connected to the caller
/// through a socket pair. The returned stream is non-blocking and ready for
/// the multiplexer.
#[cfg(unix)]
pub fn spawn_worker_thread(
    config: BridgeConfig,
) -> Result<
    (
        std::os::unix::net::UnixStream,
        std::thread::JoinHandle<Result<(), CrossplayError>>,
    ),
    CrossplayError,
> {
    use std::os::unix::net::UnixStream;

    let (engine_end, worker_end) = UnixStream::pair()?;
    engine_end.set_nonblocking(true)?;
    worker_end.set_nonblocking(true)?;
    let listener = std::net::TcpListener::bind(&config.listen_address)?;
    listener.set_nonblocking(true)?;

    let handle = std::thread::Builder::new()
        .name("crossplay-worker".to_string())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async move {
                let control = tokio::net::UnixStream::from_std(worker_end)?;
                let listener = TcpListener::from_std(listener)?;
                run_worker(config, listener, control).await
            })
        })?;
    Ok((engine_end, handle))
}
