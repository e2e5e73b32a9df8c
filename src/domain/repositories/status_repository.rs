// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 状态数据非法
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// 状态仓库特质
///
/// 定义上次已持久化状态的访问接口。实现负责在检查周期之间
/// 保存最后一次观测到的状态值。
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// 读取上次持久化的状态
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 上次状态（去除首尾空白），无记录时为空字符串
    /// * `Err(RepositoryError)` - 读取失败
    async fn load_last(&self) -> Result<String, RepositoryError>;

    /// 持久化当前状态
    async fn store(&self, status: &str) -> Result<(), RepositoryError>;
}
