//! 表示名の値オブジェクト

use super::error::UsernameError;

/// チャット参加者の表示名
///
/// 空文字・15 文字超を拒否するバリデーション付きの値オブジェクト。
/// 一意性はこの型ではなく [`super::Room`] の不変条件として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// 表示名の最大文字数
    pub const MAX_LEN: usize = 15;

    pub fn new(name: String) -> Result<Self, UsernameError> {
        if name.is_empty() {
            return Err(UsernameError::Empty);
        }
        if name.chars().count() > Self::MAX_LEN {
            return Err(UsernameError::TooLong);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
