use crossplay_common::{AckId, Position, Rotation, SessionId};
use crossplay_protocol::login::EncryptionResponsePacket;

/// Entity id the native engine uses for the receiving player itself.
pub const SELF_ENTITY_ID: u64 = 0;

/// Native engine packets the bridge knows how to translate.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePacket {
    /// Send the chunk column at (x, z) to the player.
    FullChunk { x: i32, z: i32 },
    /// Chat line; `source` is empty for system messages.
    Text { source: String, message: String },
    /// Command line without the leading slash.
    Command { command: String },
    /// `position` is at eye height.
    MovePlayer {
        entity_id: u64,
        position: Position,
        rotation: Rotation,
        on_ground: bool,
    },
    Disconnect { message: String },
    SetTime { time: i64 },
    KeepAlive { id: i64 },
}

/// Calls the multiplexer makes into the engine.
///
/// The multiplexer holds the engine by `&mut` only for the duration of one
/// call. An engine that wants to act on a session in response (close it,
/// promote it, send to it) queues the action and applies it after the call
/// returns.
pub trait NativeEngine {
    /// A client connected. `identifier` is `"id:address:port"`.
    fn add_player(&mut self, session: SessionId, identifier: &str, address: &str, port: u16);

    /// The session is gone. The player must not be used afterwards.
    fn close_player(&mut self, session: SessionId, farewell: &str, reason: &str);

    /// A packet sent with an acknowledgment requirement was delivered.
    fn handle_ack(&mut self, session: SessionId, ack: AckId);

    /// A translated packet from the client.
    fn handle_packet(&mut self, session: SessionId, packet: NativePacket);

    /// Login start. The engine answers with `promote` once the player may play.
    fn handle_authentication(&mut self, session: SessionId, username: &str, online_mode: bool);

    /// Encryption response, online mode only.
    fn process_authentication(&mut self, session: SessionId, response: EncryptionResponsePacket);
}
