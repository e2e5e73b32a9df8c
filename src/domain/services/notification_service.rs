// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::status::StatusChange;
use async_trait::async_trait;
use thiserror::Error;

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotifyError {
    /// SMTP认证被拒绝
    #[error("SMTP authentication rejected: {0}")]
    AuthRejected(String),
    /// 传输失败
    #[error("Notification transport failed: {0}")]
    Transport(String),
    /// 消息构造失败
    #[error("Invalid notification message: {0}")]
    InvalidMessage(String),
}

/// 通知服务特质
///
/// 定义状态变更通知的投递接口
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 投递一次状态变更通知
    ///
    /// # 参数
    ///
    /// * `change` - 检测到的状态变更
    async fn notify_change(&self, change: &StatusChange) -> Result<(), NotifyError>;

    /// 通知渠道名称
    fn name(&self) -> &'static str;
}
