// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::status_repository::{RepositoryError, StatusRepository};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// 文件状态仓库实现
///
/// 将上次观测到的状态保存在单行文本文件中，检查周期之间复用。
/// 写入先落到临时文件再原子改名，崩溃不会截断已保存的状态。
pub struct FileStatusRepository {
    /// 状态文件路径
    path: PathBuf,
}

impl FileStatusRepository {
    /// 创建新的文件状态仓库实例
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusRepository for FileStatusRepository {
    /// 读取上次持久化的状态
    ///
    /// 文件不存在视为尚无记录，返回空字符串
    async fn load_last(&self) -> Result<String, RepositoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(RepositoryError::Io(e)),
        }
    }

    /// 持久化当前状态
    async fn store(&self, status: &str) -> Result<(), RepositoryError> {
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, status).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Persisted status to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileStatusRepository::new(dir.path().join("latest_status.txt"));

        assert_eq!(repo.load_last().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_store_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileStatusRepository::new(dir.path().join("latest_status.txt"));

        repo.store("Pending").await.unwrap();
        assert_eq!(repo.load_last().await.unwrap(), "Pending");

        repo.store("Shortlisted").await.unwrap();
        assert_eq!(repo.load_last().await.unwrap(), "Shortlisted");
    }

    #[tokio::test]
    async fn test_load_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest_status.txt");
        tokio::fs::write(&path, "  Under Review \n").await.unwrap();

        let repo = FileStatusRepository::new(path);
        assert_eq!(repo.load_last().await.unwrap(), "Under Review");
    }

    #[tokio::test]
    async fn test_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest_status.txt");
        let repo = FileStatusRepository::new(path.clone());

        repo.store("Offer").await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
