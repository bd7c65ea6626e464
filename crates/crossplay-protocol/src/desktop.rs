use crate::chat::{ChatMessagePacket, ChatPacket};
use crate::chunk_data::ChunkDataPacket;
use crate::disconnect::DisconnectPacket;
use crate::keep_alive::KeepAlivePacket;
use crate::login::{
    EncryptionRequestPacket, EncryptionResponsePacket, LoginDisconnectPacket, LoginStartPacket,
    LoginSuccessPacket,
};
use crate::movement::{
    PlayerLookPacket, PlayerPositionAndLook, PlayerPositionAndLookPacket, PlayerPositionPacket,
};
use crate::packet::*;
use crate::time_update::TimeUpdatePacket;

/// Splits raw packet bytes into the packet id and a buffer positioned at the
/// first field.
pub fn open_packet(bytes: &[u8]) -> Result<(i32, PacketBuffer)> {
    let mut buffer = PacketBuffer::from_bytes(bytes.to_vec());
    let packet_id = buffer.read_varint()?;
    Ok((packet_id, buffer))
}

/// Serverbound packets accepted before login completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPacket {
    LoginStart(LoginStartPacket),
    EncryptionResponse(EncryptionResponsePacket),
}

impl LoginPacket {
    /// Decodes by id; `Ok(None)` for ids outside the login state.
    pub fn decode(packet_id: i32, buffer: &mut PacketBuffer) -> Result<Option<Self>> {
        let packet = match packet_id {
            0x00 => LoginPacket::LoginStart(LoginStartPacket::read_from_buffer(buffer)?),
            0x01 => {
                LoginPacket::EncryptionResponse(EncryptionResponsePacket::read_from_buffer(buffer)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(packet))
    }
}

/// Serverbound play packets the bridge translates.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayPacket {
    Chat(ChatPacket),
    Position(PlayerPositionPacket),
    Look(PlayerLookPacket),
    PositionAndLook(PlayerPositionAndLookPacket),
}

impl PlayPacket {
    /// Decodes by id; `Ok(None)` for ids the bridge does not handle.
    pub fn decode(packet_id: i32, buffer: &mut PacketBuffer) -> Result<Option<Self>> {
        let packet = match packet_id {
            0x01 => PlayPacket::Chat(ChatPacket::read_from_buffer(buffer)?),
            0x04 => PlayPacket::Position(PlayerPositionPacket::read_from_buffer(buffer)?),
            0x05 => PlayPacket::Look(PlayerLookPacket::read_from_buffer(buffer)?),
            0x06 => {
                PlayPacket::PositionAndLook(PlayerPositionAndLookPacket::read_from_buffer(buffer)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(packet))
    }

}

/// Every packet the bridge sends to a Desktop client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientboundPacket {
    LoginDisconnect(LoginDisconnectPacket),
    EncryptionRequest(EncryptionRequestPacket),
    LoginSuccess(LoginSuccessPacket),
    ChunkData(ChunkDataPacket),
    ChatMessage(ChatMessagePacket),
    Disconnect(DisconnectPacket),
    KeepAlive(KeepAlivePacket),
    PositionAndLook(PlayerPositionAndLook),
    TimeUpdate(TimeUpdatePacket),
}

impl ClientboundPacket {
    pub fn packet_id(&self) -> i32 {
        match self {
            ClientboundPacket::LoginDisconnect(_) => LoginDisconnectPacket::packet_id(),
            ClientboundPacket::EncryptionRequest(_) => EncryptionRequestPacket::packet_id(),
            ClientboundPacket::LoginSuccess(_) => LoginSuccessPacket::packet_id(),
            ClientboundPacket::ChunkData(_) => ChunkDataPacket::packet_id(),
            ClientboundPacket::ChatMessage(_) => ChatMessagePacket::packet_id(),
            ClientboundPacket::Disconnect(_) => DisconnectPacket::packet_id(),
            ClientboundPacket::KeepAlive(_) => KeepAlivePacket::packet_id(),
            ClientboundPacket::PositionAndLook(_) => PlayerPositionAndLook::packet_id(),
            ClientboundPacket::TimeUpdate(_) => TimeUpdatePacket::packet_id(),
        }
    }

    /// Raw packet bytes, id first, as carried by a SEND_PACKET frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ClientboundPacket::LoginDisconnect(packet) => packet.to_bytes(),
            ClientboundPacket::EncryptionRequest(packet) => packet.to_bytes(),
            ClientboundPacket::LoginSuccess(packet) => packet.to_bytes(),
            ClientboundPacket::ChunkData(packet) => packet.to_bytes(),
            ClientboundPacket::ChatMessage(packet) => packet.to_bytes(),
            ClientboundPacket::Disconnect(packet) => packet.to_bytes(),
            ClientboundPacket::KeepAlive(packet) => packet.to_bytes(),
            ClientboundPacket::PositionAndLook(packet) => packet.to_bytes(),
            ClientboundPacket::TimeUpdate(packet) => packet.to_bytes(),
        }
    }
}
