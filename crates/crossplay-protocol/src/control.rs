use crate::binary::{self, CodecError};
use crate::packet::PacketBuffer;
use bytes::{Buf, BytesMut};
use crossplay_common::{CrossplayError, SessionId};
use std::fmt;
use std::io;
use thiserror::Error;

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 4;
/// Default cap on `length`; a larger announced length is treated as corruption.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlKind {
    SendPacket = 0x01,
    OpenSession = 0x02,
    CloseSession = 0x03,
    EnableEncryption = 0x04,
    Shutdown = 0xFE,
    EmergencyShutdown = 0xFF,
}

impl TryFrom<u8> for ControlKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(ControlKind::SendPacket),
            0x02 => Ok(ControlKind::OpenSession),
            0x03 => Ok(ControlKind::CloseSession),
            0x04 => Ok(ControlKind::EnableEncryption),
            0xFE => Ok(ControlKind::Shutdown),
            0xFF => Ok(ControlKind::EmergencyShutdown),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlKind::SendPacket => "SEND_PACKET",
            ControlKind::OpenSession => "OPEN_SESSION",
            ControlKind::CloseSession => "CLOSE_SESSION",
            ControlKind::EnableEncryption => "ENABLE_ENCRYPTION",
            ControlKind::Shutdown => "SHUTDOWN",
            ControlKind::EmergencyShutdown => "EMERGENCY_SHUTDOWN",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid frame length {0}")]
    InvalidLength(i32),
    #[error("frame of {length} bytes exceeds limit of {max}")]
    TooLarge { length: usize, max: usize },
    #[error("unknown frame kind 0x{0:02X}")]
    UnknownKind(u8),
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: ControlKind,
        #[source]
        source: CodecError,
    },
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<FrameError> for CrossplayError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => CrossplayError::IoError(e),
            other => CrossplayError::ProtocolError(other.to_string()),
        }
    }
}

/// A complete frame whose kind has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub kind: u8,
    pub payload: Vec<u8>,
}

impl RawFrame {
    /// Session id named by the first four payload bytes, if there are four.
    pub fn leading_session(&self) -> Option<SessionId> {
        binary::read_int(&self.payload).ok().map(SessionId)
    }
}

/// Removes one complete frame from the front of `buffer`.
///
/// Returns `Ok(None)` while the frame is incomplete; the bytes stay buffered.
pub fn split_frame(
    buffer: &mut BytesMut,
    max_len: usize,
) -> Result<Option<RawFrame>, FrameError> {
    if buffer.len() < FRAME_HEADER_LEN {
        return Ok(None);
    }
    let length = binary::read_int(&buffer[..FRAME_HEADER_LEN])?;
    if length <= 0 {
        return Err(FrameError::InvalidLength(length));
    }
    let length = length as usize;
    if length > max_len {
        return Err(FrameError::TooLarge {
            length,
            max: max_len,
        });
    }
    if buffer.len() < FRAME_HEADER_LEN + length {
        buffer.reserve(FRAME_HEADER_LEN + length - buffer.len());
        return Ok(None);
    }

    buffer.advance(FRAME_HEADER_LEN);
    let mut body = buffer.split_to(length);
    let kind = body.get_u8();
    Ok(Some(RawFrame {
        kind,
        payload: body.to_vec(),
    }))
}

/// Interpreted control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// Raw Desktop packet bytes, packet id first.
    SendPacket { session: SessionId, packet: Vec<u8> },
    OpenSession {
        session: SessionId,
        address: String,
        port: u16,
    },
    CloseSession { session: SessionId },
    EnableEncryption { session: SessionId, secret: Vec<u8> },
    Shutdown,
    EmergencyShutdown,
}

impl ControlFrame {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlFrame::SendPacket { .. } => ControlKind::SendPacket,
            ControlFrame::OpenSession { .. } => ControlKind::OpenSession,
            ControlFrame::CloseSession { .. } => ControlKind::CloseSession,
            ControlFrame::EnableEncryption { .. } => ControlKind::EnableEncryption,
            ControlFrame::Shutdown => ControlKind::Shutdown,
            ControlFrame::EmergencyShutdown => ControlKind::EmergencyShutdown,
        }
    }

    pub fn session(&self) -> Option<SessionId> {
        match self {
            ControlFrame::SendPacket { session, .. }
            | ControlFrame::OpenSession { session, .. }
            | ControlFrame::CloseSession { session }
            | ControlFrame::EnableEncryption { session, .. } => Some(*session),
            ControlFrame::Shutdown | ControlFrame::EmergencyShutdown => None,
        }
    }

    /// Appends the full frame, length prefix included, to `out`.
    ///
    /// Addresses longer than 255 bytes are cut to fit the length byte.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        binary::write_int(out, 0);
        binary::write_byte(out, self.kind() as u8);

        match self {
            ControlFrame::SendPacket { session, packet } => {
                binary::write_int(out, session.0);
                out.extend_from_slice(packet);
            }
            ControlFrame::OpenSession {
                session,
                address,
                port,
            } => {
                let address = &address.as_bytes()[..address.len().min(u8::MAX as usize)];
                binary::write_int(out, session.0);
                binary::write_byte(out, address.len() as u8);
                out.extend_from_slice(address);
                binary::write_short(out, *port);
            }
            ControlFrame::CloseSession { session } => {
                binary::write_int(out, session.0);
            }
            ControlFrame::EnableEncryption { session, secret } => {
                binary::write_int(out, session.0);
                out.extend_from_slice(secret);
            }
            ControlFrame::Shutdown | ControlFrame::EmergencyShutdown => {}
        }

        let length = (out.len() - start - FRAME_HEADER_LEN) as i32;
        out[start..start + FRAME_HEADER_LEN].copy_from_slice(&length.to_be_bytes());
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Interprets a raw frame. Trailing bytes after a fixed-size payload are
    /// ignored.
    pub fn decode(raw: &RawFrame) -> Result<ControlFrame, FrameError> {
        let kind = ControlKind::try_from(raw.kind)?;
        let mut buffer = PacketBuffer::from_bytes(raw.payload.clone());
        Self::decode_payload(kind, &mut buffer)
            .map_err(|source| FrameError::Malformed { kind, source })
    }

    fn decode_payload(
        kind: ControlKind,
        buffer: &mut PacketBuffer,
    ) -> Result<ControlFrame, CodecError> {
        let frame = match kind {
            ControlKind::SendPacket => {
                let session = SessionId(buffer.read_i32()?);
                if buffer.remaining() == 0 {
                    return Err(CodecError::InvalidValue("empty packet".to_string()));
                }
                ControlFrame::SendPacket {
                    session,
                    packet: buffer.remaining_bytes().to_vec(),
                }
            }
            ControlKind::OpenSession => {
                let session = SessionId(buffer.read_i32()?);
                let address_len = buffer.read_u8()? as usize;
                let address = String::from_utf8(buffer.read_bytes_raw(address_len)?)
                    .map_err(|_| CodecError::InvalidString)?;
                let port = buffer.read_u16()?;
                ControlFrame::OpenSession {
                    session,
                    address,
                    port,
                }
            }
            ControlKind::CloseSession => ControlFrame::CloseSession {
                session: SessionId(buffer.read_i32()?),
            },
            ControlKind::EnableEncryption => ControlFrame::EnableEncryption {
                session: SessionId(buffer.read_i32()?),
                secret: buffer.remaining_bytes().to_vec(),
            },
            ControlKind::Shutdown => ControlFrame::Shutdown,
            ControlKind::EmergencyShutdown => ControlFrame::EmergencyShutdown,
        };
        Ok(frame)
    }
}
