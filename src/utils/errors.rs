// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("引擎错误: {0}")]
    EngineError(String),

    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("通知错误: {0}")]
    NotifyError(String),

    #[error("检查周期超时（超过 {0} 秒）")]
    CycleTimeout(u64),

    #[error("内部错误: {0}")]
    InternalError(String),
}
