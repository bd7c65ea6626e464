use crate::packet::*;

/// Player Position (serverbound). `feet_y` is the bottom of the player's
/// bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPositionPacket {
    pub x: f64,
    pub feet_y: f64,
    pub z: f64,
    pub on_ground: bool,
}

impl Packet for PlayerPositionPacket {
    fn packet_id() -> i32 {
        0x04
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(PlayerPositionPacket {
            x: buffer.read_f64()?,
            feet_y: buffer.read_f64()?,
            z: buffer.read_f64()?,
            on_ground: buffer.read_bool()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_f64(self.x);
        buffer.write_f64(self.feet_y);
        buffer.write_f64(self.z);
        buffer.write_bool(self.on_ground);
    }
}

/// Player Look (serverbound)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLookPacket {
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl Packet for PlayerLookPacket {
    fn packet_id() -> i32 {
        0x05
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(PlayerLookPacket {
            yaw: buffer.read_f32()?,
            pitch: buffer.read_f32()?,
            on_ground: buffer.read_bool()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_f32(self.yaw);
        buffer.write_f32(self.pitch);
        buffer.write_bool(self.on_ground);
    }
}

/// Player Position And Look (serverbound)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPositionAndLookPacket {
    pub x: f64,
    pub feet_y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl Packet for PlayerPositionAndLookPacket {
    fn packet_id() -> i32 {
        0x06
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(PlayerPositionAndLookPacket {
            x: buffer.read_f64()?,
            feet_y: buffer.read_f64()?,
            z: buffer.read_f64()?,
            yaw: buffer.read_f32()?,
            pitch: buffer.read_f32()?,
            on_ground: buffer.read_bool()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());
        buffer.write_f64(self.x);
        buffer.write_f64(self.feet_y);
        buffer.write_f64(self.z);
        buffer.write_f32(self.yaw);
        buffer.write_f32(self.pitch);
        buffer.write_bool(self.on_ground);
    }
}

/// Player Position And Look (clientbound)
/// Moves the player. This packet also closes the "Downloading Terrain" screen
/// when joining or respawning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPositionAndLook {
    /// Absolute or relative position, depending on Flags
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Absolute or relative rotation, in degrees
    pub yaw: f32,
    pub pitch: f32,
    /// Bit field for relative/absolute positions and rotations
    pub flags: u8,
    /// Teleport ID the client confirms
    pub teleport_id: i32,
}

impl Packet for PlayerPositionAndLook {
    fn packet_id() -> i32 {
        0x2F
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        Ok(PlayerPositionAndLook {
            x: buffer.read_f64()?,
            y: buffer.read_f64()?,
            z: buffer.read_f64()?,
            yaw: buffer.read_f32()?,
            pitch: buffer.read_f32()?,
            flags: buffer.read_u8()?,
            teleport_id: buffer.read_varint()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());

        buffer.write_f64(self.x);
        buffer.write_f64(self.y);
        buffer.write_f64(self.z);

        buffer.write_f32(self.yaw);
        buffer.write_f32(self.pitch);

        buffer.write_u8(self.flags);
        buffer.write_varint(self.teleport_id);
    }
}

impl PlayerPositionAndLook {
    pub fn new(x: f64, y: f64, z: f64, yaw: f32, pitch: f32, flags: u8, teleport_id: i32) -> Self {
        Self {
            x,
            y,
            z,
            yaw,
            pitch,
            flags,
            teleport_id,
        }
    }

    /// Flag constants for the flags field
    pub const RELATIVE_X: u8 = 0x01;
    pub const RELATIVE_Y: u8 = 0x02;
    pub const RELATIVE_Z: u8 = 0x04;
    pub const RELATIVE_Y_ROT: u8 = 0x08;
    pub const RELATIVE_X_ROT: u8 = 0x10;
}
