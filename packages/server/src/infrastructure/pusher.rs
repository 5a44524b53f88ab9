//! チャンネルベースの MessagePusher 実装
//!
//! ## 責務
//!
//! - セッションごとの `UnboundedSender` を管理
//! - クライアントへのテキスト送信（push_to）
//!
//! ## 設計ノート
//!
//! チャンネルの生成はセッション（`ui/session.rs`）で行われます。
//! この実装は生成された送信側チャンネルを受け取り、送信に使用します。
//! 送信自体はブロックしないため、ソケットへの書き込みが詰まっても
//! 影響はそのセッションの writer タスクに閉じます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePusher, OutboundChannel, PushError, Username};

/// セッションの送信チャンネルを束ねる MessagePusher 実装
pub struct ChannelMessagePusher {
    /// 接続中クライアントの送信チャンネル
    ///
    /// Key: 表示名
    /// Value: OutboundChannel
    clients: Arc<Mutex<HashMap<String, OutboundChannel>>>,
}

impl ChannelMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for ChannelMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for ChannelMessagePusher {
    async fn register_client(&self, name: Username, sender: OutboundChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(name.as_str().to_string(), sender);
        tracing::debug!("Client '{}' registered to MessagePusher", name);
    }

    async fn unregister_client(&self, name: &Username) {
        let mut clients = self.clients.lock().await;
        clients.remove(name.as_str());
        tracing::debug!("Client '{}' unregistered from MessagePusher", name);
    }

    async fn push_to(&self, name: &Username, content: &str) -> Result<(), PushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(name.as_str())
            .ok_or_else(|| PushError::ClientNotFound(name.as_str().to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| PushError::PushFailed(e.to_string()))?;
        Ok(())
    }
}
