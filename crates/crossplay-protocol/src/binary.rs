use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

/// Longest varint encoding of a 32-bit value.
pub const MAX_VARINT_LEN: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed integer: {0}")]
    MalformedInteger(&'static str),
    #[error("unexpected end of packet: {needed} bytes needed, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("string is not valid UTF-8")]
    InvalidString,
    #[error("string of {length} characters exceeds limit of {max}")]
    StringTooLong { length: usize, max: usize },
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub fn write_int(out: &mut Vec<u8>, value: i32) {
    let mut bytes = [0u8; 4];
    BigEndian::write_i32(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

pub fn read_int(input: &[u8]) -> Result<i32, CodecError> {
    if input.len() < 4 {
        return Err(CodecError::MalformedInteger("truncated int"));
    }
    Ok(BigEndian::read_i32(&input[..4]))
}

pub fn write_short(out: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

pub fn read_short(input: &[u8]) -> Result<u16, CodecError> {
    if input.len() < 2 {
        return Err(CodecError::MalformedInteger("truncated short"));
    }
    Ok(BigEndian::read_u16(&input[..2]))
}

pub fn write_byte(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn read_byte(input: &[u8]) -> Result<u8, CodecError> {
    input
        .first()
        .copied()
        .ok_or(CodecError::MalformedInteger("truncated byte"))
}

/// Number of bytes `write_varint` emits for `value`.
pub fn varint_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

pub fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value & !0x7F != 0 {
        out.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decodes a varint from the start of `input`, returning the value and the
/// number of bytes consumed.
pub fn read_varint(input: &[u8]) -> Result<(u32, usize), CodecError> {
    match peek_varint(input)? {
        Some(decoded) => Ok(decoded),
        None => Err(CodecError::MalformedInteger("varint ended without a terminating byte")),
    }
}

/// Like [`read_varint`], but returns `Ok(None)` when `input` ends before the
/// terminating byte, so stream decoders can wait for more data.
pub fn peek_varint(input: &[u8]) -> Result<Option<(u32, usize)>, CodecError> {
    let mut value: u32 = 0;
    for (index, &byte) in input.iter().take(MAX_VARINT_LEN).enumerate() {
        if index == MAX_VARINT_LEN - 1 && byte & 0xF0 != 0 {
            return Err(CodecError::MalformedInteger("varint exceeds 32 bits"));
        }
        value |= ((byte & 0x7F) as u32) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some((value, index + 1)));
        }
    }
    if input.len() >= MAX_VARINT_LEN {
        return Err(CodecError::MalformedInteger("varint exceeds 32 bits"));
    }
    Ok(None)
}
