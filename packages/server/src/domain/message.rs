//! メッセージの値オブジェクトとワイヤフォーマット描画
//!
//! ワイヤ上・トランスクリプト上に現れる文字列はすべてここで組み立てる。

use super::{Timestamp, Username, error::MessageError};

/// メッセージ本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(text: String) -> Result<Self, MessageError> {
        if text.is_empty() {
            return Err(MessageError::Empty);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1 回のブロードキャストに対応するメッセージ
///
/// 永続化・転送されるのは `render()` が返す整形済み文字列のみで、
/// 構造体そのものは揮発的な値。
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub from: Username,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(from: Username, content: MessageContent, timestamp: Timestamp) -> Self {
        Self {
            from,
            content,
            timestamp,
        }
    }

    /// `[timestamp][name]: text` 形式の整形済み行
    ///
    /// トランスクリプトにはこの形で 1 行ずつ保存される。
    pub fn render(&self) -> String {
        format!(
            "[{}][{}]: {}",
            self.timestamp.to_display(),
            self.from,
            self.content.as_str()
        )
    }

    /// 受信者へ送るワイヤ上の表現（整形済み行を空行で挟んだもの）
    pub fn to_wire(&self) -> String {
        format!("\n{}\n", self.render())
    }
}

/// 受信者自身の入力プロンプト行 `\n[timestamp][name]:`
pub fn input_prompt(name: &Username, timestamp: Timestamp) -> String {
    format!("\n[{}][{}]:", timestamp.to_display(), name)
}

/// 入室アナウンス
pub fn join_announcement(name: &Username) -> String {
    format!("\n{} has joined our chat...\n", name)
}

/// 退室アナウンス
pub fn leave_announcement(name: &Username) -> String {
    format!("\n{} has left our chat...\n", name)
}
