pub mod error;
pub mod types;

pub use error::CrossplayError;
pub use types::{AckId, Dimension, Position, Result, Rotation, SessionId};
