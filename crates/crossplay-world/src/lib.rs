pub mod chunk;
pub mod translate;

pub use chunk::{ChunkColumn, ChunkError, ChunkProvider, MemoryChunkProvider, SubChunk};
pub use translate::{BlockTranslator, Direction};
