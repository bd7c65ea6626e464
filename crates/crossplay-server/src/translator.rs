use crate::engine::{NativePacket, SELF_ENTITY_ID};
use crate::session::Session;
use crossplay_common::{Position, Rotation};
use crossplay_protocol::chat::{ChatMessagePacket, ChatPosition, TextComponent};
use crossplay_protocol::chunk_data::{ChunkDataPacket, ChunkSerializer};
use crossplay_protocol::disconnect::DisconnectPacket;
use crossplay_protocol::keep_alive::KeepAlivePacket;
use crossplay_protocol::movement::PlayerPositionAndLook;
use crossplay_protocol::time_update::TimeUpdatePacket;
use crossplay_protocol::{ClientboundPacket, PlayPacket};
use crossplay_world::chunk::ChunkProvider;
use crossplay_world::translate::BlockTranslator;
use thiserror::Error;

/// Distance from a player's feet to their eyes.
pub const EYE_HEIGHT: f64 = 1.62;

/// Ticks in one day; the native time counter wraps here.
const DAY_LENGTH: i64 = 24000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslateError {
    #[error("empty chat message")]
    EmptyMessage,
    #[error("non-finite coordinates")]
    NonFiniteCoordinates,
}

/// What a translation may read: the session it is for and the loaded world.
pub struct TranslationContext<'a> {
    pub session: &'a Session,
    pub chunks: &'a dyn ChunkProvider,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    serializer: ChunkSerializer,
}

impl Translator {
    pub fn new(blocks: BlockTranslator) -> Self {
        Translator {
            serializer: ChunkSerializer::new(blocks),
        }
    }

    pub fn serializer(&self) -> &ChunkSerializer {
        &self.serializer
    }

    pub fn from_native(
        &self,
        ctx: &TranslationContext<'_>,
        packet: &NativePacket,
    ) -> Vec<ClientboundPacket> {
        match packet {
            NativePacket::FullChunk { x, z } => match ctx.chunks.chunk(*x, *z) {
                Some(column) => {
                    let payload = self
                        .serializer
                        .serialize(column, ctx.session.dimension.has_sky_light());
                    vec![ClientboundPacket::ChunkData(ChunkDataPacket::from_payload(
                        *x, *z, payload,
                    ))]
                }
                None => Vec::new(),
            },
            NativePacket::Text { source, message } => {
                let text = if source.is_empty() {
                    message.clone()
                } else {
                    format!("<{}> {}", source, message)
                };
                vec![ClientboundPacket::ChatMessage(ChatMessagePacket::new(
                    &TextComponent::plain(text),
                    ChatPosition::Chat,
                ))]
            }
            // Commands only travel client -> engine.
            NativePacket::Command { .. } => Vec::new(),
            NativePacket::MovePlayer {
                entity_id,
                position,
                rotation,
                ..
            } => {
                if *entity_id != SELF_ENTITY_ID {
                    return Vec::new();
                }
                vec![ClientboundPacket::PositionAndLook(PlayerPositionAndLook::new(
                    position.x,
                    position.y - EYE_HEIGHT,
                    position.z,
                    rotation.yaw,
                    rotation.pitch,
                    0,
                    0,
                ))]
            }
            NativePacket::Disconnect { message } => vec![ClientboundPacket::Disconnect(
                DisconnectPacket::new(&TextComponent::plain(message.as_str())),
            )],
            NativePacket::SetTime { time } => {
                vec![ClientboundPacket::TimeUpdate(TimeUpdatePacket {
                    world_age: *time,
                    time_of_day: time.rem_euclid(DAY_LENGTH),
                })]
            }
            NativePacket::KeepAlive { id } => {
                vec![ClientboundPacket::KeepAlive(KeepAlivePacket::new(*id))]
            }
        }
    }

    pub fn from_desktop(
        &self,
        session: &Session,
        packet: &PlayPacket,
    ) -> Result<Vec<NativePacket>, TranslateError> {
        let translated = match packet {
            PlayPacket::Chat(chat) => {
                if chat.message.trim().is_empty() {
                    return Err(TranslateError::EmptyMessage);
                }
                match chat.message.strip_prefix('/') {
                    Some(command) => NativePacket::Command {
                        command: command.to_string(),
                    },
                    None => NativePacket::Text {
                        source: session.username.clone().unwrap_or_default(),
                        message: chat.message.clone(),
                    },
                }
            }
            PlayPacket::Position(position) => move_player(
                Position::new(position.x, position.feet_y + EYE_HEIGHT, position.z),
                session.rotation,
                position.on_ground,
            )?,
            PlayPacket::Look(look) => move_player(
                session.position,
                Rotation::new(look.yaw, look.pitch),
                look.on_ground,
            )?,
            PlayPacket::PositionAndLook(both) => move_player(
                Position::new(both.x, both.feet_y + EYE_HEIGHT, both.z),
                Rotation::new(both.yaw, both.pitch),
                both.on_ground,
            )?,
        };
        Ok(vec![translated])
    }
}

fn move_player(
    position: Position,
    rotation: Rotation,
    on_ground: bool,
) -> Result<NativePacket, TranslateError> {
    if !position.is_finite() || !rotation.yaw.is_finite() || !rotation.pitch.is_finite() {
        return Err(TranslateError::NonFiniteCoordinates);
    }
    Ok(NativePacket::MovePlayer {
        entity_id: SELF_ENTITY_ID,
        position,
        rotation,
        on_ground,
    })
}
