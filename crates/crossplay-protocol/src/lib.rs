pub mod binary;
pub mod chat;
pub mod chunk_data;
pub mod codec;
pub mod control;
pub mod desktop;
pub mod disconnect;
pub mod frame_reader;
pub mod handshake;
pub mod keep_alive;
pub mod login;
pub mod movement;
pub mod packet;
pub mod status;
pub mod time_update;

// Re-export commonly used items
pub use binary::CodecError;
pub use chunk_data::{ChunkPayload, ChunkSerializer};
pub use control::{ControlFrame, ControlKind, FrameError, RawFrame};
pub use desktop::{ClientboundPacket, LoginPacket, PlayPacket};
pub use frame_reader::FrameReader;
pub use packet::{Packet, PacketBuffer};
