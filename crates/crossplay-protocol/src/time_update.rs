use crate::packet::*;

/// Time Update. A negative time of day freezes the client's day cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeUpdatePacket {
    pub world_age: i64,
    pub time_of_day: i64,
}

impl Packet for TimeUpdatePacket {
    fn packet_id() -> i32 {
        0x47
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(TimeUpdatePacket {
            world_age: buffer.read_i64()?,
            time_of_day: buffer.read_i64()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_i64(self.world_age);
        buffer.write_i64(self.time_of_day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_update_round_trip() {
        let packet = TimeUpdatePacket {
            world_age: 24000,
            time_of_day: -6000,
        };
        let mut buffer = PacketBuffer::from_bytes(packet.to_bytes());
        assert_eq!(buffer.read_varint().unwrap(), 0x47);
        assert_eq!(TimeUpdatePacket::read_from_buffer(&mut buffer).unwrap(), packet);
    }
}
