use crate::packet::*;

/// Next state requested by the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Status,
    Login,
}

impl NextState {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(NextState::Status),
            2 => Some(NextState::Login),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            NextState::Status => 1,
            NextState::Login => 2,
        }
    }
}

/// Handshake packet
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakePacket {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: i32,
}

impl Packet for HandshakePacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(HandshakePacket {
            protocol_version: buffer.read_varint()?,
            server_address: buffer.read_string(255)?,
            server_port: buffer.read_u16()?,
            next_state: buffer.read_varint()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_varint(self.protocol_version);
        buffer.write_string(&self.server_address);
        buffer.write_u16(self.server_port);
        buffer.write_varint(self.next_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_wire_layout() {
        let handshake = HandshakePacket {
            protocol_version: 340,
            server_address: "localhost".to_string(),
            server_port: 25565,
            next_state: 2,
        };

        let bytes = handshake.to_bytes();
        assert_eq!(&bytes[..3], [0x00, 0xD4, 0x02]);
        assert_eq!(bytes[3], 9);
        assert_eq!(&bytes[4..13], b"localhost");
        assert_eq!(&bytes[13..], [0x63, 0xDD, 0x02]);

        let mut buffer = PacketBuffer::from_bytes(bytes);
        assert_eq!(buffer.read_varint().unwrap(), HandshakePacket::packet_id());
        let read = HandshakePacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(read, handshake);
        assert_eq!(NextState::from_id(read.next_state), Some(NextState::Login));
    }

    #[test]
    fn test_unknown_next_state() {
        assert_eq!(NextState::from_id(3), None);
        assert_eq!(NextState::Status.id(), 1);
    }
}
