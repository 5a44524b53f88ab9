//! ドメイン層
//!
//! チャットリレーのドメインモデル（値オブジェクト・エンティティ）と、
//! ドメイン層が必要とするポート（trait）を定義します。

mod error;
mod history;
mod message;
mod pusher;
mod repository;
mod room;
mod timestamp;
mod username;

pub use error::{HistoryError, MessageError, PushError, RoomError, UsernameError};
pub use history::HistoryStore;
pub use message::{
    ChatMessage, MessageContent, input_prompt, join_announcement, leave_announcement,
};
pub use pusher::{MessagePusher, OutboundChannel};
pub use repository::RoomRepository;
pub use room::{MAX_CLIENTS, Participant, Room};
pub use timestamp::Timestamp;
pub use username::Username;
