use crate::binary::{self, CodecError};
use byteorder::{BigEndian, ByteOrder};

pub type Result<T> = std::result::Result<T, CodecError>;

/// Desktop protocol packet. `write_to_buffer` emits the packet id followed by
/// the fields; `read_from_buffer` expects the id to have been consumed by the
/// caller, which needs it to pick the packet type in the first place.
pub trait Packet {
    /// Packet ID
    fn packet_id() -> i32
    where
        Self: Sized;

    /// Reads the packet fields from the buffer.
    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self>
    where
        Self: Sized;

    /// Writes the packet id and fields to the buffer.
    fn write_to_buffer(&self, buffer: &mut PacketBuffer);

    /// Encodes the packet into a fresh byte vector, id first.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = PacketBuffer::new();
        self.write_to_buffer(&mut buffer);
        buffer.into_inner()
    }
}

/// Desktop packet buffer. Holds the packet bytes and a read cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    buffer: Vec<u8>,
    cursor: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    /// Wraps received bytes for reading; the cursor starts at 0.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            cursor: 0,
        }
    }

    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Bytes from the cursor to the end of the buffer.
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    fn take(&mut self, needed: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(CodecError::UnexpectedEof { needed, remaining });
        }
        let start = self.cursor;
        self.cursor += needed;
        Ok(&self.buffer[start..start + needed])
    }

    fn take_fixed(&mut self, needed: usize, what: &'static str) -> Result<&[u8]> {
        if self.remaining() < needed {
            return Err(CodecError::MalformedInteger(what));
        }
        self.take(needed)
    }

    /// Writes a VarInt. Negative values use the two's complement bits, which
    /// always take five bytes.
    pub fn write_varint(&mut self, value: i32) {
        binary::write_varint(&mut self.buffer, value as u32);
    }

    pub fn read_varint(&mut self) -> Result<i32> {
        let (value, len) = binary::read_varint(self.remaining_bytes())?;
        self.cursor += len;
        Ok(value as i32)
    }

    pub fn write_u8(&mut self, value: u8) {
        binary::write_byte(&mut self.buffer, value);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let value = binary::read_byte(self.remaining_bytes())?;
        self.cursor += 1;
        Ok(value)
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidValue(format!("invalid boolean byte {}", other))),
        }
    }

    // Write an u16 in network (big-endian) order.
    pub fn write_u16(&mut self, value: u16) {
        binary::write_short(&mut self.buffer, value);
    }

    // Read an u16 in network (big-endian) order.
    pub fn read_u16(&mut self) -> Result<u16> {
        let value = binary::read_short(self.remaining_bytes())?;
        self.cursor += 2;
        Ok(value)
    }

    pub fn write_i32(&mut self, value: i32) {
        binary::write_int(&mut self.buffer, value);
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let value = binary::read_int(self.remaining_bytes())?;
        self.cursor += 4;
        Ok(value)
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_i64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take_fixed(8, "truncated long")?))
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_f32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take_fixed(4, "truncated float")?))
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_f64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take_fixed(8, "truncated double")?))
    }

    /// Appends bytes without a length prefix.
    pub fn write_bytes_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn read_bytes_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// Writes a VarInt length followed by the bytes.
    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as i32);
        self.write_bytes_raw(bytes);
    }

    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let length = self.read_varint()?;
        if length < 0 {
            return Err(CodecError::InvalidValue(format!("negative array length {}", length)));
        }
        self.read_bytes_raw(length as usize)
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_byte_array(value.as_bytes());
    }

    /// Reads a VarInt-prefixed UTF-8 string of at most `max_chars` characters.
    pub fn read_string(&mut self, max_chars: usize) -> Result<String> {
        let bytes = self.read_byte_array()?;
        let value = String::from_utf8(bytes).map_err(|_| CodecError::InvalidString)?;
        let length = value.chars().count();
        if length > max_chars {
            return Err(CodecError::StringTooLong {
                length,
                max: max_chars,
            });
        }
        Ok(value)
    }

    pub fn write_uuid(&mut self, value: uuid::Uuid) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    pub fn read_uuid(&mut self) -> Result<uuid::Uuid> {
        let bytes = self.take(16)?;
        uuid::Uuid::from_slice(bytes).map_err(|e| CodecError::InvalidValue(e.to_string()))
    }
}
