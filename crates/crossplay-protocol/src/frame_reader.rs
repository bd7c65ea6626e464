use crate::binary;
use crate::control::{split_frame, FrameError, RawFrame, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};
use bytes::BytesMut;
use std::io::{self, Read};
use tracing::trace;

const READ_CHUNK: usize = 8 * 1024;

/// Accumulates bytes from a non-blocking reader and hands out complete frames.
#[derive(Debug)]
pub struct FrameReader {
    buffer: BytesMut,
    max_frame_len: usize,
    closed: bool,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameReader {
    pub fn new(max_frame_len: usize) -> Self {
        FrameReader {
            buffer: BytesMut::with_capacity(READ_CHUNK),
            max_frame_len,
            closed: false,
        }
    }

    /// Reads until the buffer holds one complete frame, so a backlog stays in
    /// the socket. `WouldBlock` ends the read. A read of zero bytes or a hard
    /// error marks the channel closed.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0;
        loop {
            let wanted = self.wanted().min(READ_CHUNK);
            if wanted == 0 {
                break;
            }
            match reader.read(&mut chunk[..wanted]) {
                Ok(0) => {
                    self.closed = true;
                    break;
                }
                Ok(read) => {
                    self.buffer.extend_from_slice(&chunk[..read]);
                    total += read;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.closed = true;
                    return Err(e);
                }
            }
        }
        if total > 0 {
            trace!(len = total, buffered = self.buffer.len(), "read from control channel");
        }
        Ok(total)
    }

    /// Bytes missing before the next frame is complete. Zero once it is, or
    /// when the length prefix is invalid and `next_frame` will reject it.
    fn wanted(&self) -> usize {
        if self.buffer.len() < FRAME_HEADER_LEN {
            return FRAME_HEADER_LEN - self.buffer.len();
        }
        match binary::read_int(&self.buffer[..FRAME_HEADER_LEN]) {
            Ok(length) if length > 0 && length as usize <= self.max_frame_len => {
                (FRAME_HEADER_LEN + length as usize).saturating_sub(self.buffer.len())
            }
            _ => 0,
        }
    }

    /// Appends bytes received some other way.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Removes the next complete frame. A bad length prefix leaves the stream
    /// unsynchronised, so the buffer is discarded along with it.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>, FrameError> {
        match split_frame(&mut self.buffer, self.max_frame_len) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.buffer.clear();
                Err(e)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bytes held, at most one frame's worth when filled by `fill_from`.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlFrame;
    use assert_matches::assert_matches;
    use crossplay_common::SessionId;
    use std::collections::VecDeque;

    /// Hands out scripted reads, then `WouldBlock`.
    struct ScriptedReader {
        reads: VecDeque<Vec<u8>>,
        eof: bool,
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(mut bytes) => {
                    if bytes.len() > buf.len() {
                        let rest = bytes.split_off(buf.len());
                        self.reads.push_front(rest);
                    }
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                None if self.eof => Ok(0),
                None => Err(io::ErrorKind::WouldBlock.into()),
            }
        }
    }

    #[test]
    fn test_would_block_is_not_an_error() {
        let mut reader = ScriptedReader {
            reads: VecDeque::new(),
            eof: false,
        };
        let mut frames = FrameReader::default();
        assert_eq!(frames.fill_from(&mut reader).unwrap(), 0);
        assert!(!frames.is_closed());
        assert!(frames.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_frame_split_across_reads() {
        let bytes = ControlFrame::CloseSession {
            session: SessionId(7),
        }
        .encode();
        let mut frames = FrameReader::default();

        for byte in &bytes[..bytes.len() - 1] {
            let mut reader = ScriptedReader {
                reads: VecDeque::from(vec![vec![*byte]]),
                eof: false,
            };
            frames.fill_from(&mut reader).unwrap();
            assert!(frames.next_frame().unwrap().is_none());
        }

        frames.push(&bytes[bytes.len() - 1..]);
        let raw = frames.next_frame().unwrap().unwrap();
        assert_eq!(
            ControlFrame::decode(&raw).unwrap(),
            ControlFrame::CloseSession {
                session: SessionId(7)
            }
        );
        assert_eq!(frames.buffered(), 0);
    }

    #[test]
    fn test_one_frame_per_call() {
        let mut bytes = ControlFrame::Shutdown.encode();
        bytes.extend(ControlFrame::EmergencyShutdown.encode());
        let mut frames = FrameReader::default();
        frames.push(&bytes);

        assert_eq!(frames.next_frame().unwrap().unwrap().kind, 0xFE);
        assert_eq!(frames.buffered(), 5);
        assert_eq!(frames.next_frame().unwrap().unwrap().kind, 0xFF);
    }

    #[test]
    fn test_eof_marks_closed() {
        let mut reader = ScriptedReader {
            reads: VecDeque::from(vec![vec![0, 0]]),
            eof: true,
        };
        let mut frames = FrameReader::default();
        assert_eq!(frames.fill_from(&mut reader).unwrap(), 2);
        assert!(frames.is_closed());
        assert!(frames.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_bad_length_clears_buffer() {
        let mut frames = FrameReader::new(64);
        frames.push(&[0, 0, 4, 0, 1, 2, 3]);
        assert_matches!(frames.next_frame(), Err(FrameError::TooLarge { .. }));
        assert_eq!(frames.buffered(), 0);
    }

    #[test]
    fn test_backlog_stays_in_reader() {
        let frame = ControlFrame::CloseSession {
            session: SessionId(3),
        }
        .encode();
        let backlog: Vec<u8> = frame.iter().copied().cycle().take(frame.len() * 1000).collect();
        let mut reader = ScriptedReader {
            reads: VecDeque::from(vec![backlog]),
            eof: false,
        };
        let mut frames = FrameReader::default();

        for _ in 0..3 {
            assert_eq!(frames.fill_from(&mut reader).unwrap(), frame.len());
            assert_eq!(frames.buffered(), frame.len());
            assert!(frames.next_frame().unwrap().is_some());
        }
        assert_eq!(frames.buffered(), 0);
    }

    #[test]
    fn test_bad_length_stops_reading() {
        let mut reader = ScriptedReader {
            reads: VecDeque::from(vec![vec![0, 0, 4, 0, 1, 2, 3, 4, 5]]),
            eof: false,
        };
        let mut frames = FrameReader::new(64);
        assert_eq!(frames.fill_from(&mut reader).unwrap(), 4);
        assert_matches!(frames.next_frame(), Err(FrameError::TooLarge { .. }));
    }

    #[test]
    fn test_hard_error_marks_closed() {
        struct ResetReader;

        impl Read for ResetReader {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::ConnectionReset.into())
            }
        }

        let mut frames = FrameReader::default();
        assert!(frames.fill_from(&mut ResetReader).is_err());
        assert!(frames.is_closed());
        assert_eq!(frames.fill_from(&mut ResetReader).unwrap(), 0);
    }
}
