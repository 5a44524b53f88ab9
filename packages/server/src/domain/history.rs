//! 履歴ストアのポート定義
//!
//! ドメイン層が必要とするトランスクリプト永続化のインターフェースを
//! 定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::error::HistoryError;

/// 整形済み行の追記専用トランスクリプト
///
/// 永続化はベストエフォートで、失敗しても配送は継続される。
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 1 行追記する
    async fn append(&self, line: &str) -> Result<(), HistoryError>;

    /// 全行を古い順に読み出す
    ///
    /// ファイルが存在しない・空の場合は空の Vec を返す（初回起動）。
    async fn load_all(&self) -> Result<Vec<String>, HistoryError>;

    /// トランスクリプトを空に切り詰める（サーバ起動時に 1 回だけ呼ぶ）
    async fn reset(&self) -> Result<(), HistoryError>;
}
