//! Room Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Participant, Timestamp, Username, error::RoomError};

/// Room へのアクセスを提供するリポジトリ
///
/// 登録・削除・スナップショットは互いに排他で、部分的に変更された
/// 集合が観測されることはない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者を登録する（重複・定員チェック込みで原子的）
    async fn try_register(&self, name: Username, joined_at: Timestamp) -> Result<(), RoomError>;

    /// 参加者を削除する（冪等）
    async fn remove_participant(&self, name: &Username) -> bool;

    /// その時点の参加者一覧のスナップショットを取得する
    ///
    /// 返り値はコピーであり、呼び出し側がロックを保持したまま
    /// I/O を行うことはない。
    async fn participants(&self) -> Vec<Participant>;

    /// 接続中の参加者数を取得する
    async fn count(&self) -> usize;
}
