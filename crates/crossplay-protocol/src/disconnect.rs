use crate::chat::TextComponent;
use crate::packet::*;

/// Disconnect (play, clientbound) with a JSON reason.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectPacket {
    pub reason: String,
}

impl DisconnectPacket {
    pub fn new(reason: &TextComponent) -> Self {
        Self {
            reason: reason.to_json(),
        }
    }
}

impl Packet for DisconnectPacket {
    fn packet_id() -> i32 {
        0x1A
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(DisconnectPacket {
            reason: buffer.read_string(32767)?,
        })
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
    fn test_disconnect_reason() {
        let packet = DisconnectPacket::new(&TextComponent::plain("bye"));
        let mut buffer = PacketBuffer::from_bytes(packet.to_bytes());
        assert_eq!(buffer.read_varint().unwrap(), 0x1A);
        assert_eq!(buffer.read_string(32767).unwrap(), r#"{"text":"bye"}"#);
    }
}
