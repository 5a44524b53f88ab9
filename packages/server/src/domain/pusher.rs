//! メッセージ送信のポート定義

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Username, error::PushError};

/// セッションの送信側チャンネル
///
/// 送信はブロックしないため、遅いクライアントが他のセッションや
/// レジストリを塞ぐことはない。
pub type OutboundChannel = mpsc::UnboundedSender<String>;

/// クライアントへのテキスト送信の抽象化
///
/// チャンネルの生成はセッション（UI 層）が行い、この trait の実装が
/// 送信側チャンネルを管理する。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録する
    async fn register_client(&self, name: Username, sender: OutboundChannel);

    /// クライアントの送信チャンネルを登録解除する（冪等）
    async fn unregister_client(&self, name: &Username);

    /// 指定クライアントへテキストを送信する
    async fn push_to(&self, name: &Username, content: &str) -> Result<(), PushError>;
}
