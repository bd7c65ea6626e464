use crate::binary::{self, CodecError};
use crate::control::{split_frame, ControlFrame, FrameError, DEFAULT_MAX_FRAME_LEN};
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Largest Desktop packet body the client may send (a 3-byte varint length).
pub const MAX_DESKTOP_PACKET_LEN: usize = 2_097_151;

#[derive(Debug, Clone, Copy)]
pub struct ControlCodec {
    max_frame_len: usize,
}

impl Default for ControlCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl ControlCodec {
    pub fn new(max_frame_len: usize) -> Self {
        ControlCodec { max_frame_len }
    }
}

impl Decoder for ControlCodec {
    type Item = ControlFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A frame with a bad kind or payload is still correctly delimited, so
        // it is skipped rather than ending the stream.
        while let Some(raw) = split_frame(src, self.max_frame_len)? {
            match ControlFrame::decode(&raw) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => warn!(kind = raw.kind, error = %e, "skipping control frame"),
            }
        }
        Ok(None)
    }
}

impl Encoder<ControlFrame> for ControlCodec {
    type Error = FrameError;

    fn encode(&mut self, item: ControlFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut out = Vec::new();
        item.encode_into(&mut out);
        dst.extend_from_slice(&out);
        Ok(())
    }
}

/// Desktop client packets: `[varint length][packet id][fields]`. Items are the
/// packet bytes starting with the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopPacketCodec;

impl Decoder for DesktopPacketCodec {
    type Item = Vec<u8>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (length, prefix) = match binary::peek_varint(src)? {
            Some(decoded) => decoded,
            None => return Ok(None),
        };
        let length = length as usize;
        if length == 0 {
            return Err(CodecError::InvalidValue("empty packet".to_string()).into());
        }
        if length > MAX_DESKTOP_PACKET_LEN {
            return Err(FrameError::TooLarge {
                length,
                max: MAX_DESKTOP_PACKET_LEN,
            });
        }
        if src.len() < prefix + length {
            src.reserve(prefix + length - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        Ok(Some(src.split_to(length).to_vec()))
    }
}

impl Encoder<Vec<u8>> for DesktopPacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut prefix = Vec::with_capacity(binary::MAX_VARINT_LEN);
        binary::write_varint(&mut prefix, item.len() as u32);
        dst.reserve(prefix.len() + item.len());
        dst.extend_from_slice(&prefix);
        dst.extend_from_slice(&item);
        Ok(())
    }
}
