//! UseCase 層
//!
//! セッション（UI 層）から呼び出されるアプリケーションロジック。
//! 依存はすべて `Arc<dyn Trait>` で注入され、Infrastructure 層の
//! 具体実装には依存しない。

mod broadcast;
mod error;
mod join_chat;
mod leave_chat;
mod send_message;

pub use broadcast::Broadcaster;
pub use error::JoinError;
pub use join_chat::JoinChatUseCase;
pub use leave_chat::LeaveChatUseCase;
pub use send_message::SendMessageUseCase;
