use crate::packet::*;
use serde::{Deserialize, Serialize};

/// JSON body of the status response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: crate::chat::TextComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: u32,
    pub online: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusRequestPacket;

impl Packet for StatusRequestPacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn read_from_buffer(_buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(StatusRequestPacket)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponsePacket {
    pub response: String,
}

impl StatusResponsePacket {
    pub fn new(status: &ServerStatus) -> Self {
        // Serializing plain structs of strings and integers cannot fail.
        let response = serde_json::to_string(status).unwrap_or_default();
        StatusResponsePacket { response }
    }
}

impl Packet for StatusResponsePacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(StatusResponsePacket {
            response: buffer.read_string(32767)?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.response);
    }
}

/// Ping (serverbound) and pong (clientbound) share id and layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingPacket {
    pub payload: i64,
}

impl Packet for PingPacket {
    fn packet_id() -> i32 {
        0x01
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(PingPacket {
            payload: buffer.read_i64()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_i64(self.payload);
    }
}
