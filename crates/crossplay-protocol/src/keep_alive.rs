use crate::packet::*;

/// Keep Alive (clientbound). The client echoes the id back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAlivePacket {
    pub keep_alive_id: i64,
}

impl Packet for KeepAlivePacket {
    fn packet_id() -> i32 {
        0x1F
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(KeepAlivePacket {
            keep_alive_id: buffer.read_i64()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_i64(self.keep_alive_id);
    }
}

impl KeepAlivePacket {
    pub fn new(keep_alive_id: i64) -> Self {
        Self { keep_alive_id }
    }
}
