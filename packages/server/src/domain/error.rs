//! ドメイン層のエラー型定義
//!
//! バリデーション系のエラーは Display がそのままクライアントへ送る
//! 文言になるため、文言を変更する場合はワイヤプロトコルの変更になる。

use thiserror::Error;

/// 表示名のバリデーションエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username cannot be empty")]
    Empty,
    #[error("username cannot be more than 15 characters long")]
    TooLong,
}

/// メッセージ本文のバリデーションエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("you can't send empty messages")]
    Empty,
}

/// Room への参加登録エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    /// 同名の参加者が既に存在する（再入力を促す）
    #[error("username already exists")]
    NameTaken,
    /// 定員超過（接続を閉じる）
    #[error("Sorry, the chat room is full. Please try again later.")]
    RoomFull,
}

/// 履歴ファイル操作のエラー
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// クライアントへのメッセージ送信エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError {
    /// 送信先のチャンネルが登録されていない
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    /// チャンネルが閉じているなど、送信自体の失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
