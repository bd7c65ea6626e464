use crossplay_common::{Dimension, Position, Rotation, SessionId};
use std::fmt;

/// Where a session is in the login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    PreLogin,
    Play,
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStatus::PreLogin => write!(f, "PRE_LOGIN"),
            HandshakeStatus::Play => write!(f, "PLAY"),
        }
    }
}

/// One connected Desktop client.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub address: String,
    pub port: u16,
    pub status: HandshakeStatus,
    pub username: Option<String>,
    pub dimension: Dimension,
    /// Last known position, at eye height.
    pub position: Position,
    pub rotation: Rotation,
}

impl Session {
    pub fn new(id: SessionId, address: String, port: u16) -> Self {
        Self {
            id,
            address,
            port,
            status: HandshakeStatus::PreLogin,
            username: None,
            dimension: Dimension::default(),
            position: Position::new(0.0, 64.0, 0.0),
            rotation: Rotation::default(),
        }
    }

    /// Identifier handed to the engine: `"id:address:port"`.
    pub fn identifier(&self) -> String {
        format!("{}:{}:{}", self.id, self.address, self.port)
    }

    /// Username once login start arrived, the identifier before.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => username.clone(),
            None => self.identifier(),
        }
    }

    /// Message shown to other players when this one leaves.
    pub fn farewell(&self) -> String {
        format!("\u{a7}e{} has left the game", self.display_name())
    }

    pub fn is_playing(&self) -> bool {
        self.status == HandshakeStatus::Play
    }

    pub fn update_position(&mut self, position: Position, rotation: Rotation) {
        self.position = position;
        self.rotation = rotation;
    }
}
