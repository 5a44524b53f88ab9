//! UseCase: 退室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveChatUseCase::execute() メソッド
//! - 退室処理（レジストリからの削除、チャンネル登録解除、退室アナウンス）
//!
//! ### なぜこのテストが必要か
//! - 二重クローズしても壊れない冪等なテアダウンを保証
//! - 退室アナウンスが残りの参加者にだけ届くことを保証
//! - 既に削除済みの場合にアナウンスが重複しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の退室とアナウンス
//! - エッジケース：最後の参加者の退室（アナウンス対象なし）
//! - 異常系：同じ参加者の二重退室

use std::sync::Arc;

use crate::domain::{MessagePusher, RoomRepository, Username, leave_announcement};

use super::Broadcaster;

/// 退室のユースケース
pub struct LeaveChatUseCase {
    /// Repository（レジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ送信の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Broadcaster（ファンアウト）
    broadcaster: Arc<Broadcaster>,
}

impl LeaveChatUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            broadcaster,
        }
    }

    /// 退室を実行する（冪等）
    ///
    /// 1. レジストリから削除（既に削除済みなら何もしない）
    /// 2. 送信チャンネルを登録解除
    /// 3. 実際に削除された場合のみ、残りの参加者へ退室アナウンス
    ///
    /// # Returns
    ///
    /// 実際に削除が行われた場合 `true`（2 回目以降の呼び出しでは `false`）
    pub async fn execute(&self, name: &Username) -> bool {
        let removed = self.repository.remove_participant(name).await;
        self.message_pusher.unregister_client(name).await;

        if removed {
            tracing::info!("Client '{}' disconnected and removed from registry", name);
            let line = leave_announcement(name);
            self.broadcaster.fan_out(&line, Some(name)).await;
        }
        removed
    }
}
