//! UseCase 層のエラー型定義

use thiserror::Error;

use crate::domain::RoomError;

/// 参加登録のエラー
///
/// Display はそのままクライアントへ送る文言になる。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// 同名の参加者が既に存在する（再入力を促す）
    #[error("username already exists")]
    NameTaken,
    /// 定員超過（接続を閉じる）
    #[error("Sorry, the chat room is full. Please try again later.")]
    RoomFull,
}

impl From<RoomError> for JoinError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::NameTaken => JoinError::NameTaken,
            RoomError::RoomFull => JoinError::RoomFull,
        }
    }
}
