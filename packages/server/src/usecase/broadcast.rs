//! ブロードキャストエンジン
//!
//! レジストリのスナップショットに対して整形済み行をファンアウトする。
//! スナップショットはリポジトリのロック内で取得され、送信はロック解放後に
//! 行われるため、遅いクライアントへの配送が他のセッションの登録・削除を
//! 塞ぐことはない。

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{MessagePusher, RoomRepository, Timestamp, Username, input_prompt};

/// 整形済み行のファンアウト
pub struct Broadcaster {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl Broadcaster {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// `exclude` 以外の全参加者へ `line` を配送する
    ///
    /// 各受信者には `line` の直後にその受信者自身の入力プロンプトを
    /// 連結して送るため、どの端末も自分のプロンプト行で終わる。
    /// 個々の受信者への送信失敗はログに記録してスキップし、残りの配送は
    /// 継続する。
    ///
    /// # Arguments
    ///
    /// * `line` - 配送する整形済み行（改行含む）
    /// * `exclude` - 配送から除外する参加者（入退室・発言の本人）
    ///
    /// # Returns
    ///
    /// 実際に配送できた参加者の表示名リスト（参加順）
    pub async fn fan_out(&self, line: &str, exclude: Option<&Username>) -> Vec<Username> {
        let snapshot = self.repository.participants().await;
        let stamp = Timestamp::new(self.clock.now_millis());

        let mut delivered = Vec::new();
        for participant in &snapshot {
            if Some(&participant.name) == exclude {
                continue;
            }
            let payload = format!("{}{}", line, input_prompt(&participant.name, stamp));
            match self
                .message_pusher
                .push_to(&participant.name, &payload)
                .await
            {
                Ok(()) => delivered.push(participant.name.clone()),
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver broadcast to '{}': {}",
                        participant.name,
                        e
                    );
                }
            }
        }
        delivered
    }
}
