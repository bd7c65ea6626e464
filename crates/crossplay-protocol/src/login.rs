use crate::chat::TextComponent;
use crate::packet::*;
use uuid::Uuid;

/// Longest name a client may announce in login start.
pub const MAX_USERNAME_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStartPacket {
    pub username: String,
}

impl Packet for LoginStartPacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        let username = buffer.read_string(MAX_USERNAME_LENGTH)?;

        Ok(LoginStartPacket { username })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.username);
    }
}

/// Sent by the server in online mode to begin the encryption handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionRequestPacket {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl Packet for EncryptionRequestPacket {
    fn packet_id() -> i32 {
        0x01
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(EncryptionRequestPacket {
            server_id: buffer.read_string(20)?,
            public_key: buffer.read_byte_array()?,
            verify_token: buffer.read_byte_array()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.server_id);
        buffer.write_byte_array(&self.public_key);
        buffer.write_byte_array(&self.verify_token);
    }
}

/// Client answer to the encryption request. Both fields are still encrypted
/// with the server's public key; decrypting them is the engine's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponsePacket {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl Packet for EncryptionResponsePacket {
    fn packet_id() -> i32 {
        0x01
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(EncryptionResponsePacket {
            shared_secret: buffer.read_byte_array()?,
            verify_token: buffer.read_byte_array()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_byte_array(&self.shared_secret);
        buffer.write_byte_array(&self.verify_token);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccessPacket {
    pub uuid: Uuid,
    pub username: String,
}

impl LoginSuccessPacket {
    pub fn new(username: String) -> Self {
        // Offline mode UUID (version 3, derived from the username)
        let uuid = Uuid::new_v3(
            &Uuid::NAMESPACE_DNS,
            format!("OfflinePlayer:{}", username).as_bytes(),
        );

        LoginSuccessPacket { uuid, username }
    }
}

impl Packet for LoginSuccessPacket {
    fn packet_id() -> i32 {
        0x02
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        let uuid = buffer.read_string(36)?;
        let uuid = Uuid::parse_str(&uuid)
            .map_err(|e| crate::binary::CodecError::InvalidValue(e.to_string()))?;
        let username = buffer.read_string(MAX_USERNAME_LENGTH)?;

        Ok(LoginSuccessPacket { uuid, username })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        // This protocol version sends the hyphenated textual form.
        buffer.write_string(&self.uuid.hyphenated().to_string());
        buffer.write_string(&self.username);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginDisconnectPacket {
    pub reason: String,
}

impl LoginDisconnectPacket {
    pub fn new(reason: &str) -> Self {
        LoginDisconnectPacket {
            reason: TextComponent::plain(reason).to_json(),
        }
    }
}

impl Packet for LoginDisconnectPacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        let reason = buffer.read_string(32767)?;
        Ok(LoginDisconnectPacket { reason })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_uuid_is_stable() {
        let first = LoginSuccessPacket::new("Steve".to_string());
        let second = LoginSuccessPacket::new("Steve".to_string());
        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.uuid.get_version_num(), 3);
        assert_ne!(first.uuid, LoginSuccessPacket::new("Alex".to_string()).uuid);
    }

    #[test]
    fn test_login_success_round_trip() {
        let packet = LoginSuccessPacket::new("Steve".to_string());
        let mut buffer = PacketBuffer::from_bytes(packet.to_bytes());
        assert_eq!(buffer.read_varint().unwrap(), 0x02);
        assert_eq!(LoginSuccessPacket::read_from_buffer(&mut buffer).unwrap(), packet);
    }

    #[test]
    fn test_login_start_name_limit() {
        let mut buffer = PacketBuffer::new();
        buffer.write_string("ThisNameIsFarTooLong");
        assert!(LoginStartPacket::read_from_buffer(&mut buffer).is_err());
    }

    #[test]
    fn test_encryption_response_fields() {
        let packet = EncryptionResponsePacket {
            shared_secret: vec![1, 2, 3],
            verify_token: vec![4, 5],
        };
        assert_eq!(packet.to_bytes(), [0x01, 3, 1, 2, 3, 2, 4, 5]);
    }

    #[test]
    fn test_login_disconnect_is_json() {
        let packet = LoginDisconnectPacket::new("Server closed");
        assert_eq!(packet.reason, r#"{"text":"Server closed"}"#);
    }
}
