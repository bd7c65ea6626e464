use crate::packet::*;
use serde::{Deserialize, Serialize};

/// Longest chat message a client may send.
pub const MAX_CHAT_LENGTH: usize = 256;

/// Minimal JSON text component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        TextComponent {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn colored(text: impl Into<String>, color: impl Into<String>) -> Self {
        TextComponent {
            text: text.into(),
            color: Some(color.into()),
            extra: Vec::new(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"text\":\"\"}"))
    }
}

/// Where a clientbound chat message is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChatPosition {
    Chat = 0,
    System = 1,
    ActionBar = 2,
}

impl ChatPosition {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ChatPosition::Chat),
            1 => Ok(ChatPosition::System),
            2 => Ok(ChatPosition::ActionBar),
            other => Err(crate::binary::CodecError::InvalidValue(format!(
                "unknown chat position {}",
                other
            ))),
        }
    }
}

/// Chat message sent by the client (serverbound).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPacket {
    pub message: String,
}

impl Packet for ChatPacket {
    fn packet_id() -> i32 {
        0x01
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(ChatPacket {
            message: buffer.read_string(MAX_CHAT_LENGTH)?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.message);
    }
}

/// Chat message shown to the client (clientbound).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessagePacket {
    pub json: String,
    pub position: ChatPosition,
}

impl ChatMessagePacket {
    pub fn new(component: &TextComponent, position: ChatPosition) -> Self {
        ChatMessagePacket {
            json: component.to_json(),
            position,
        }
    }
}

impl Packet for ChatMessagePacket {
    fn packet_id() -> i32 {
        0x0F
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(ChatMessagePacket {
            json: buffer.read_string(32767)?,
            position: ChatPosition::from_byte(buffer.read_u8()?)?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.json);
        buffer.write_u8(self.position as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_text_component_json() {
        assert_eq!(TextComponent::plain("hi").to_json(), r#"{"text":"hi"}"#);
        assert_eq!(
            TextComponent::colored("bye", "yellow").to_json(),
            r#"{"text":"bye","color":"yellow"}"#
        );
    }

    #[test]
    fn test_chat_message_layout() {
        let packet = ChatMessagePacket::new(&TextComponent::plain("hi"), ChatPosition::System);
        let bytes = packet.to_bytes();
        assert_eq!(bytes[0], 0x0F);
        assert_eq!(*bytes.last().unwrap(), 1);

        let mut buffer = PacketBuffer::from_bytes(bytes);
        buffer.read_varint().unwrap();
        assert_eq!(ChatMessagePacket::read_from_buffer(&mut buffer).unwrap(), packet);
    }

    #[test]
    fn test_chat_rejects_long_messages() {
        let mut buffer = PacketBuffer::new();
        buffer.write_string(&"a".repeat(MAX_CHAT_LENGTH + 1));
        assert_matches!(
            ChatPacket::read_from_buffer(&mut buffer),
            Err(crate::binary::CodecError::StringTooLong { .. })
        );
    }
}
