//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージ送信処理（検証、履歴追記、送信者を除くブロードキャスト）
//!
//! ### なぜこのテストが必要か
//! - 空メッセージが配送も永続化もされないことを保証
//! - 履歴追記の失敗が配送を妨げないこと（ベストエフォート）を保証
//! - 整形済み行がトランスクリプトとワイヤで一致することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - 異常系：空メッセージ、履歴追記の失敗
//! - エッジケース：送信者のみが接続している場合（ブロードキャスト対象なし）

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    ChatMessage, HistoryStore, MessageContent, MessageError, Timestamp, Username,
};

use super::Broadcaster;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// HistoryStore（トランスクリプトの抽象化）
    history: Arc<dyn HistoryStore>,
    /// Broadcaster（ファンアウト）
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            broadcaster,
            clock,
        }
    }

    /// メッセージ送信を実行する
    ///
    /// 1. 本文を検証し、整形済み行を組み立てる
    /// 2. 履歴へ追記する（失敗しても配送は継続するベストエフォート）
    /// 3. 送信者以外へブロードキャストする
    ///
    /// # Arguments
    ///
    /// * `from` - 送信者の表示名
    /// * `text` - 受信した生の 1 行（改行除去済み）
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Username>)` - 配送できた参加者リスト
    /// * `Err(MessageError)` - 空メッセージ（配送も永続化もしない）
    pub async fn execute(
        &self,
        from: &Username,
        text: String,
    ) -> Result<Vec<Username>, MessageError> {
        let content = MessageContent::new(text)?;
        let message = ChatMessage::new(
            from.clone(),
            content,
            Timestamp::new(self.clock.now_millis()),
        );
        let rendered = message.render();

        // 永続化は配送のクリティカルパスに含めない
        if let Err(e) = self.history.append(&rendered).await {
            tracing::warn!("Failed to append message to history: {}", e);
        }

        let delivered = self
            .broadcaster
            .fan_out(&message.to_wire(), Some(from))
            .await;
        Ok(delivered)
    }
}
