//! チャットルームのエンティティ
//!
//! 参加者の集合を保持する、定員付き・名前一意のレジストリ。

use super::{Timestamp, Username, error::RoomError};

/// 同時接続数の上限
pub const MAX_CLIENTS: usize = 10;

/// 接続中の参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: Username,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(name: Username, joined_at: Timestamp) -> Self {
        Self { name, joined_at }
    }
}

/// チャットルーム
///
/// 不変条件:
/// - 同名の参加者は同時に存在しない
/// - 参加者数は定員を超えない
/// - `participants` は参加順を保持する
#[derive(Debug, Clone)]
pub struct Room {
    participants: Vec<Participant>,
    capacity: usize,
}

impl Room {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            participants: Vec::new(),
            capacity,
        }
    }

    /// 参加者を登録する
    ///
    /// 重複チェック・定員チェック・追加を 1 回の呼び出しで行う。
    /// 重複チェックが定員チェックより先（満室でも名前重複は NameTaken）。
    pub fn try_register(&mut self, name: Username, joined_at: Timestamp) -> Result<(), RoomError> {
        if self.participants.iter().any(|p| p.name == name) {
            return Err(RoomError::NameTaken);
        }
        if self.participants.len() >= self.capacity {
            return Err(RoomError::RoomFull);
        }
        self.participants.push(Participant::new(name, joined_at));
        Ok(())
    }

    /// 参加者を削除する（冪等）
    ///
    /// # Returns
    ///
    /// 実際に削除が行われた場合 `true`、既に存在しない場合 `false`
    pub fn remove_participant(&mut self, name: &Username) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.name != name);
        self.participants.len() != before
    }

    /// 参加順の参加者一覧
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}
