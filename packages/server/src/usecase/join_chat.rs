//! UseCase: 参加登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinChatUseCase::execute() / announce_join() / replay_history()
//! - 参加登録（原子的な重複・定員チェック）、入室アナウンス、履歴リプレイ
//!
//! ### なぜこのテストが必要か
//! - 定員と名前の一意性はレジストリの中核の不変条件
//! - 入室アナウンスが新規参加者自身に届かないことを保証
//! - 履歴リプレイが保存順で新規参加者にだけ届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の登録・アナウンス・リプレイ
//! - 異常系：重複した表示名、定員超過
//! - エッジケース：履歴が空の初回起動

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    HistoryStore, MessagePusher, OutboundChannel, RoomRepository, Timestamp, Username,
    input_prompt, join_announcement,
};

use super::{Broadcaster, error::JoinError};

/// 参加登録のユースケース
pub struct JoinChatUseCase {
    /// Repository（レジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ送信の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// HistoryStore（トランスクリプトの抽象化）
    history: Arc<dyn HistoryStore>,
    /// Broadcaster（ファンアウト）
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl JoinChatUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        history: Arc<dyn HistoryStore>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            history,
            broadcaster,
            clock,
        }
    }

    /// 参加登録を実行する
    ///
    /// 重複・定員チェックと追加はリポジトリ内で原子的に行われる。
    /// 登録に成功した場合のみ送信チャンネルを MessagePusher に登録する。
    ///
    /// # Arguments
    ///
    /// * `name` - 登録する表示名（形式チェック済み）
    /// * `sender` - このセッションへの送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 登録成功（参加時刻）
    /// * `Err(JoinError)` - 名前重複または定員超過
    pub async fn execute(
        &self,
        name: Username,
        sender: OutboundChannel,
    ) -> Result<Timestamp, JoinError> {
        let joined_at = Timestamp::new(self.clock.now_millis());
        self.repository.try_register(name.clone(), joined_at).await?;
        self.message_pusher.register_client(name.clone(), sender).await;
        tracing::info!("Client '{}' registered at {}", name, joined_at.to_display());
        Ok(joined_at)
    }

    /// 入室アナウンスを新規参加者以外へブロードキャストする
    pub async fn announce_join(&self, name: &Username) {
        let line = join_announcement(name);
        self.broadcaster.fan_out(&line, Some(name)).await;
    }

    /// 保存済みの履歴を新規参加者にだけ再生する
    ///
    /// 履歴の読み出し失敗は参加処理を妨げない（ログに記録して空扱い）。
    pub async fn replay_history(&self, name: &Username) {
        let lines = match self.history.load_all().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("Failed to load history for '{}': {}", name, e);
                return;
            }
        };
        for line in lines {
            if let Err(e) = self
                .message_pusher
                .push_to(name, &format!("{}\n", line))
                .await
            {
                tracing::warn!("Failed to replay history to '{}': {}", name, e);
                return;
            }
        }
    }

    /// 新規参加者自身の入力プロンプトを送る
    pub async fn send_initial_prompt(&self, name: &Username) {
        let stamp = Timestamp::new(self.clock.now_millis());
        if let Err(e) = self
            .message_pusher
            .push_to(name, &input_prompt(name, stamp))
            .await
        {
            tracing::warn!("Failed to send initial prompt to '{}': {}", name, e);
        }
    }
}
