//! フラットファイルによる HistoryStore 実装
//!
//! 操作ごとに open/close する追記専用のトランスクリプトファイル。
//! ファイルハンドルをセッション間で共有しないため、行単位のトラフィック
//! であればハンドル競合は発生しない。

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};

use crate::domain::{HistoryError, HistoryStore};

/// フラットファイルのトランスクリプト
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn append(&self, line: &str) -> Result<(), HistoryError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<String>, HistoryError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // 初回起動: まだ何も書かれていない
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::Io(e)),
        };
        Ok(content.lines().map(str::to_string).collect())
    }

    async fn reset(&self) -> Result<(), HistoryError> {
        fs::File::create(&self.path).await?;
        Ok(())
    }
}
