// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::status::StatusSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 登录失败
    #[error("Login failed: {0}")]
    LoginFailed(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 门户不可达
    #[error("Portal unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::Timeout => true,
            EngineError::Unavailable(_) => true,
            // 登录与选择器失败说明页面结构变了，重试没有意义
            EngineError::Browser(_) | EngineError::LoginFailed(_) => false,
        }
    }
}

/// 状态探测引擎特质
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// 执行一次门户状态观测
    async fn probe(&self) -> Result<StatusSnapshot, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
