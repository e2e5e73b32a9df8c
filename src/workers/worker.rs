// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// Worker trait定义
///
/// 后台工作器的统一生命周期接口，监控循环通过它启动和命名
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器主循环
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}
