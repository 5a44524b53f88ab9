//! タイムスタンプの値オブジェクト

use idobata_shared::time::timestamp_to_display;

/// Unix ミリ秒のタイムスタンプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// `%Y-%m-%d %H:%M:%S` (UTC) 形式の表示用文字列
    pub fn to_display(&self) -> String {
        timestamp_to_display(self.0)
    }
}
