use crate::config::BridgeConfig;
use crate::engine::{NativeEngine, NativePacket};
use crate::session::{HandshakeStatus, Session};
use crate::session_manager::SessionManager;
use crate::translator::{TranslationContext, Translator};
use crossplay_common::{AckId, Dimension, SessionId};
use crossplay_protocol::control::{ControlFrame, ControlKind, FrameError, RawFrame};
use crossplay_protocol::desktop::{open_packet, LoginPacket, PlayPacket};
use crossplay_protocol::packet::PacketBuffer;
use crossplay_protocol::{ClientboundPacket, FrameReader};
use crossplay_world::chunk::ChunkProvider;
use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use tracing::{debug, info, trace, warn};

/// Reason given to the engine when the worker reports a closed connection.
pub const CONNECTION_CLOSED: &str = "Connection closed";

/// Unwritten output allowed per unit of maximum frame length before the
/// backlog is dropped as a write failure.
const OUTBOUND_FRAMES: usize = 4;

/// What one call to [`Multiplexer::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No complete frame was available.
    Idle,
    /// One frame of this kind was handled.
    Handled(ControlKind),
    /// A frame was rejected as a protocol violation.
    Rejected,
    /// The worker announced it is going away; every session was closed.
    Shutdown,
    /// The channel reached end of stream.
    ChannelClosed,
}

/// Outstanding acknowledgments.
///
/// An id is allocated when a packet is sent with an acknowledgment
/// requirement and stays pending until the frame carrying it is written, at
/// which point it moves to the delivered batch. The engine is told about the
/// batch on the next poll and the entries are removed.
#[derive(Debug, Default)]
pub struct AckTable {
    pending: HashMap<AckId, SessionId>,
    delivered: Vec<AckId>,
    next: u32,
}

impl AckTable {
    /// Allocates an id that is not currently pending.
    pub fn allocate(&mut self, session: SessionId) -> AckId {
        loop {
            let id = AckId(self.next);
            self.next = self.next.wrapping_add(1);
            if !self.pending.contains_key(&id) {
                self.pending.insert(id, session);
                return id;
            }
        }
    }

    pub fn mark_delivered(&mut self, ack: AckId) {
        if self.pending.contains_key(&ack) {
            self.delivered.push(ack);
        }
    }

    /// Removes and returns every delivered entry still owned by a session.
    pub fn take_delivered(&mut self) -> Vec<(AckId, SessionId)> {
        let delivered = std::mem::take(&mut self.delivered);
        delivered
            .into_iter()
            .filter_map(|ack| self.pending.remove(&ack).map(|session| (ack, session)))
            .collect()
    }

    /// Forgets an id whose frame was lost.
    pub fn discard(&mut self, ack: AckId) {
        self.pending.remove(&ack);
    }

    /// Drops every entry of `session`, delivered or not.
    pub fn discard_session(&mut self, session: SessionId) {
        self.pending.retain(|_, owner| *owner != session);
    }

    pub fn is_pending(&self, ack: AckId) -> bool {
        self.pending.contains_key(&ack)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Bytes queued for the channel. Frames are written whole and in order; a
/// frame carrying an ack is delivered once its last byte is written.
#[derive(Debug, Default)]
struct Outbound {
    buffer: Vec<u8>,
    queued_total: u64,
    written_total: u64,
    awaiting: VecDeque<(u64, AckId)>,
}

impl Outbound {
    fn queue(&mut self, frame: &ControlFrame, ack: Option<AckId>) {
        let before = self.buffer.len();
        frame.encode_into(&mut self.buffer);
        self.queued_total += (self.buffer.len() - before) as u64;
        if let Some(ack) = ack {
            self.awaiting.push_back((self.queued_total, ack));
        }
    }

    /// Writes as much as the channel takes. Returns the acks whose frames are
    /// now complete along with the write outcome.
    fn flush<W: Write>(&mut self, channel: &mut W) -> (Vec<AckId>, io::Result<()>) {
        let mut written = 0;
        let result = loop {
            if written == self.buffer.len() {
                break Ok(());
            }
            match channel.write(&self.buffer[written..]) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        self.buffer.drain(..written);
        self.written_total += written as u64;

        let mut delivered = Vec::new();
        while let Some(&(end, ack)) = self.awaiting.front() {
            if end > self.written_total {
                break;
            }
            self.awaiting.pop_front();
            delivered.push(ack);
        }
        (delivered, result)
    }

    /// Drops everything still queued and returns the acks that will never be
    /// delivered.
    fn discard(&mut self) -> Vec<AckId> {
        self.buffer.clear();
        self.written_total = self.queued_total;
        self.awaiting.drain(..).map(|(_, ack)| ack).collect()
    }

    fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Tick-side end of the control channel. Owns every live session and never
/// waits on the channel, which is expected to be non-blocking.
pub struct Multiplexer<C> {
    channel: C,
    reader: FrameReader,
    outbound: Outbound,
    outbound_limit: usize,
    sessions: SessionManager,
    acks: AckTable,
    translator: Translator,
    online_mode: bool,
    shutdown_message: String,
}

impl<C: Read + Write> Multiplexer<C> {
    pub fn new(channel: C, config: &BridgeConfig) -> Self {
        Multiplexer {
            channel,
            reader: FrameReader::new(config.max_frame_length),
            outbound: Outbound::default(),
            outbound_limit: config.max_frame_length.saturating_mul(OUTBOUND_FRAMES),
            sessions: SessionManager::new(),
            acks: AckTable::default(),
            translator: Translator::new(config.block_translator()),
            online_mode: config.online_mode,
            shutdown_message: config.shutdown_message.clone(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get_session(id)
    }

    pub fn acks(&self) -> &AckTable {
        &self.acks
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Bytes still waiting for the channel to accept them.
    pub fn pending_output(&self) -> usize {
        self.outbound.pending_bytes()
    }

    /// Registers a session announced by the worker.
    pub fn open_session<E: NativeEngine>(
        &mut self,
        engine: &mut E,
        id: SessionId,
        address: &str,
        port: u16,
    ) -> bool {
        let session = Session::new(id, address.to_string(), port);
        let identifier = session.identifier();
        if !self.sessions.add_session(session) {
            warn!(session = %id, "session already open, ignoring");
            return false;
        }
        info!(session = %id, address, port, "session opened");
        engine.add_player(id, &identifier, address, port);
        true
    }

    pub fn close_session<E: NativeEngine>(&mut self, engine: &mut E, id: SessionId) {
        self.close(engine, id, CONNECTION_CLOSED);
    }

    /// Closes `id` and tells the worker. Closing an unknown or already closed
    /// session does nothing.
    pub fn close<E: NativeEngine>(&mut self, engine: &mut E, id: SessionId, reason: &str) {
        if self.detach(engine, id, reason) {
            self.write_frame(ControlFrame::CloseSession { session: id }, None);
        }
    }

    fn detach<E: NativeEngine>(&mut self, engine: &mut E, id: SessionId, reason: &str) -> bool {
        let session = match self.sessions.remove_session(id) {
            Some(session) => session,
            None => return false,
        };
        self.acks.discard_session(id);
        info!(session = %id, reason, "session closed");
        engine.close_player(id, &session.farewell(), reason);
        true
    }

    /// Sends an already encoded Desktop packet. With `requires_ack` the
    /// returned id is reported through `handle_ack` once the frame is written.
    pub fn send(
        &mut self,
        id: SessionId,
        packet: &ClientboundPacket,
        requires_ack: bool,
    ) -> Option<AckId> {
        if !self.sessions.contains(id) {
            debug!(session = %id, packet_id = packet.packet_id(), "send to closed session dropped");
            return None;
        }
        let ack = requires_ack.then(|| self.acks.allocate(id));
        self.write_frame(
            ControlFrame::SendPacket {
                session: id,
                packet: packet.to_bytes(),
            },
            ack,
        );
        ack
    }

    /// Translates a native packet and sends the results. The ack, if any,
    /// rides on the last packet; a packet with no translation is delivered
    /// immediately.
    pub fn put_packet(
        &mut self,
        chunks: &dyn ChunkProvider,
        id: SessionId,
        packet: &NativePacket,
        requires_ack: bool,
    ) -> Option<AckId> {
        let session = match self.sessions.get_session(id) {
            Some(session) => session,
            None => {
                debug!(session = %id, "native packet for closed session dropped");
                return None;
            }
        };
        let ctx = TranslationContext { session, chunks };
        let packets = self.translator.from_native(&ctx, packet);
        if packets.is_empty() {
            trace!(session = %id, ?packet, "native packet has no translation");
        }

        let ack = requires_ack.then(|| self.acks.allocate(id));
        let last = packets.len().saturating_sub(1);
        for (index, packet) in packets.iter().enumerate() {
            let frame = ControlFrame::SendPacket {
                session: id,
                packet: packet.to_bytes(),
            };
            self.write_frame(frame, if index == last { ack } else { None });
        }
        if let (Some(ack), true) = (ack, packets.is_empty()) {
            self.acks.mark_delivered(ack);
        }
        ack
    }

    /// Asks the worker to switch the session's stream to encryption.
    pub fn enable_encryption(&mut self, id: SessionId, secret: &[u8]) {
        if !self.sessions.contains(id) {
            return;
        }
        self.write_frame(
            ControlFrame::EnableEncryption {
                session: id,
                secret: secret.to_vec(),
            },
            None,
        );
    }

    /// Moves a session from PRE_LOGIN to PLAY once authentication succeeded.
    pub fn promote(&mut self, id: SessionId) -> bool {
        match self.sessions.get_session_mut(id) {
            Some(session) => {
                session.status = HandshakeStatus::Play;
                info!(session = %id, "session promoted to play");
                true
            }
            None => false,
        }
    }

    pub fn set_dimension(&mut self, id: SessionId, dimension: Dimension) {
        if let Some(session) = self.sessions.get_session_mut(id) {
            session.dimension = dimension;
        }
    }

    /// Closes every session with the configured shutdown message and tells
    /// the worker to stop.
    pub fn shutdown<E: NativeEngine>(&mut self, engine: &mut E) {
        let reason = self.shutdown_message.clone();
        for id in self.sessions.ids() {
            self.close(engine, id, &reason);
        }
        self.write_frame(ControlFrame::Shutdown, None);
    }

    /// Tells the worker to stop immediately. Sessions are left as they are.
    pub fn emergency_shutdown(&mut self) {
        self.write_frame(ControlFrame::EmergencyShutdown, None);
    }

    /// Writes queued output, reports delivered acks and handles at most one
    /// inbound frame.
    pub fn poll<E: NativeEngine>(&mut self, engine: &mut E) -> PollOutcome {
        self.flush();
        for (ack, session) in self.acks.take_delivered() {
            engine.handle_ack(session, ack);
        }

        if let Err(e) = self.reader.fill_from(&mut self.channel) {
            warn!(error = %e, "control channel read failed");
        }
        match self.reader.next_frame() {
            Ok(Some(raw)) => self.dispatch(engine, raw),
            Ok(None) if self.reader.is_closed() => PollOutcome::ChannelClosed,
            Ok(None) => PollOutcome::Idle,
            Err(e) => {
                warn!(error = %e, "discarding unframed control channel input");
                PollOutcome::Rejected
            }
        }
    }

    fn dispatch<E: NativeEngine>(&mut self, engine: &mut E, raw: RawFrame) -> PollOutcome {
        let frame = match ControlFrame::decode(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = raw.kind, error = %e, "rejected control frame");
                let reason = match e {
                    // names a session that may not exist yet; a live one stays untouched
                    FrameError::Malformed {
                        kind: ControlKind::OpenSession,
                        ..
                    } => None,
                    FrameError::UnknownKind(kind) => Some(format!("Unknown frame kind {}", kind)),
                    _ => Some(format!("Malformed frame kind {}", raw.kind)),
                };
                if let (Some(id), Some(reason)) = (raw.leading_session(), reason) {
                    self.close(engine, id, &reason);
                }
                return PollOutcome::Rejected;
            }
        };

        let kind = frame.kind();
        trace!(%kind, session = ?frame.session(), "control frame");
        match frame {
            ControlFrame::SendPacket { session, packet } => {
                self.handle_packet(engine, session, &packet);
            }
            ControlFrame::OpenSession {
                session,
                address,
                port,
            } => {
                self.open_session(engine, session, &address, port);
            }
            ControlFrame::CloseSession { session } => {
                self.close_session(engine, session);
            }
            ControlFrame::EnableEncryption { session, .. } => {
                warn!(session = %session, "worker sent ENABLE_ENCRYPTION, ignoring");
            }
            ControlFrame::Shutdown | ControlFrame::EmergencyShutdown => {
                info!(%kind, sessions = self.sessions.len(), "worker shutting down");
                let reason = self.shutdown_message.clone();
                for id in self.sessions.ids() {
                    self.detach(engine, id, &reason);
                }
                return PollOutcome::Shutdown;
            }
        }
        PollOutcome::Handled(kind)
    }

    fn handle_packet<E: NativeEngine>(&mut self, engine: &mut E, id: SessionId, bytes: &[u8]) {
        let playing = match self.sessions.get_session(id) {
            Some(session) => session.is_playing(),
            None => {
                debug!(session = %id, "packet for unknown session dropped");
                return;
            }
        };
        let (packet_id, mut buffer) = match open_packet(bytes) {
            Ok(opened) => opened,
            Err(e) => {
                warn!(session = %id, playing, error = %e, "unreadable packet id");
                if !playing {
                    self.close(engine, id, "Malformed packet");
                }
                return;
            }
        };

        if playing {
            self.handle_play(engine, id, packet_id, &mut buffer);
        } else {
            self.handle_login(engine, id, packet_id, &mut buffer);
        }
    }

    fn handle_login<E: NativeEngine>(
        &mut self,
        engine: &mut E,
        id: SessionId,
        packet_id: i32,
        buffer: &mut PacketBuffer,
    ) {
        let accepted = packet_id == 0x00 || (packet_id == 0x01 && self.online_mode);
        if !accepted {
            self.close(engine, id, &format!("Unexpected packet {}", packet_id));
            return;
        }

        match LoginPacket::decode(packet_id, buffer) {
            Ok(Some(LoginPacket::LoginStart(start))) => {
                self.sessions.set_username(id, &start.username);
                debug!(session = %id, username = %start.username, "login start");
                engine.handle_authentication(id, &start.username, self.online_mode);
            }
            Ok(Some(LoginPacket::EncryptionResponse(response))) => {
                engine.process_authentication(id, response);
            }
            Ok(None) => {
                self.close(engine, id, &format!("Unexpected packet {}", packet_id));
            }
            Err(e) => {
                warn!(session = %id, packet_id, error = %e, "malformed login packet");
                self.close(engine, id, &format!("Malformed packet {}", packet_id));
            }
        }
    }

    fn handle_play<E: NativeEngine>(
        &mut self,
        engine: &mut E,
        id: SessionId,
        packet_id: i32,
        buffer: &mut PacketBuffer,
    ) {
        let packet = match PlayPacket::decode(packet_id, buffer) {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                trace!(session = %id, packet_id, "untranslated play packet ignored");
                return;
            }
            Err(e) => {
                warn!(session = %id, packet_id, error = %e, "malformed play packet dropped");
                return;
            }
        };

        let translated = match self.sessions.get_session(id) {
            Some(session) => self.translator.from_desktop(session, &packet),
            None => return,
        };
        let natives = match translated {
            Ok(natives) => natives,
            Err(e) => {
                debug!(session = %id, packet_id, error = %e, "play packet rejected");
                return;
            }
        };

        for native in natives {
            if let NativePacket::MovePlayer {
                position, rotation, ..
            } = &native
            {
                if let Some(session) = self.sessions.get_session_mut(id) {
                    session.update_position(*position, *rotation);
                }
            }
            engine.handle_packet(id, native);
        }
    }

    fn write_frame(&mut self, frame: ControlFrame, ack: Option<AckId>) {
        self.outbound.queue(&frame, ack);
        self.flush();
        if self.outbound.pending_bytes() > self.outbound_limit {
            warn!(
                pending = self.outbound.pending_bytes(),
                limit = self.outbound_limit,
                "control channel backlog over limit"
            );
            self.drop_output();
        }
    }

    fn flush(&mut self) {
        let (delivered, result) = self.outbound.flush(&mut self.channel);
        for ack in delivered {
            self.acks.mark_delivered(ack);
        }
        if let Err(e) = result {
            warn!(error = %e, dropped = self.outbound.pending_bytes(), "control channel write failed");
            self.drop_output();
        }
    }

    fn drop_output(&mut self) {
        for ack in self.outbound.discard() {
            self.acks.discard(ack);
        }
    }
}
