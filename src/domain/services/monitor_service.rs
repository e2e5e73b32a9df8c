// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::status::{CheckOutcome, CheckReport, StatusChange};
use crate::domain::repositories::status_repository::{RepositoryError, StatusRepository};
use crate::domain::services::notification_service::{Notifier, NotifyError};
use crate::engines::traits::{EngineError, StatusProbe};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// 监控错误类型
#[derive(Error, Debug)]
pub enum MonitorError {
    /// 探测失败
    #[error("Probe failed: {0}")]
    Engine(#[from] EngineError),
    /// 状态读写失败
    #[error("Status store failed: {0}")]
    Repository(#[from] RepositoryError),
    /// 通知投递失败
    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl MonitorError {
    /// 判断错误是否可重试
    ///
    /// 只有探测阶段的瞬时故障值得在本周期内重试；状态已持久化之后
    /// 的失败重跑检查不会再产生同一变更
    pub fn is_retryable(&self) -> bool {
        match self {
            MonitorError::Engine(e) => e.is_retryable(),
            MonitorError::Repository(_) | MonitorError::Notify(_) => false,
        }
    }
}

/// 监控服务
///
/// 封装单次检查的核心业务规则：探测门户状态，与上次持久化的
/// 状态比较，发生变更时先持久化再投递通知
pub struct MonitorService<P, R, N>
where
    P: StatusProbe,
    R: StatusRepository,
    N: Notifier,
{
    /// 状态探测引擎
    probe: Arc<P>,
    /// 状态仓库
    repository: Arc<R>,
    /// 通知器
    notifier: Arc<N>,
}

impl<P, R, N> MonitorService<P, R, N>
where
    P: StatusProbe,
    R: StatusRepository,
    N: Notifier,
{
    /// 创建新的监控服务实例
    ///
    /// # 参数
    ///
    /// * `probe` - 状态探测引擎
    /// * `repository` - 状态仓库
    /// * `notifier` - 通知器
    pub fn new(probe: Arc<P>, repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            probe,
            repository,
            notifier,
        }
    }

    /// 执行一次完整检查
    ///
    /// 状态未变化时没有任何副作用。检测到变更时先写状态文件再发
    /// 通知，通知失败不会导致下个周期用过期的previous重复播报，
    /// 投递失败通过检查结果向上层暴露
    ///
    /// # 返回值
    ///
    /// * `Ok(CheckReport)` - 本次检查的报告
    /// * `Err(MonitorError)` - 探测、持久化或通知失败
    pub async fn check_once(&self) -> Result<CheckReport, MonitorError> {
        let check_id = Uuid::new_v4();
        let started = Instant::now();

        let snapshot = self.probe.probe().await?;
        let portal_latency_ms = started.elapsed().as_millis() as u64;

        let last = self.repository.load_last().await?;

        if snapshot.value == last {
            info!(check_id = %check_id, "No change detected");
            return Ok(CheckReport {
                id: check_id,
                outcome: CheckOutcome::Unchanged,
                portal_latency_ms,
                checked_at: Utc::now(),
            });
        }

        self.repository.store(&snapshot.value).await?;

        let change = StatusChange {
            previous: last,
            current: snapshot.value.clone(),
            observed_at: snapshot.observed_at,
        };

        // 空观测只持久化，不发通知
        if snapshot.is_empty() {
            info!(check_id = %check_id, "Status cleared, skipping notification");
        } else {
            self.notifier.notify_change(&change).await?;
        }

        counter!("status_changes_total").increment(1);
        info!(check_id = %check_id, "Status changed: {}", change);

        Ok(CheckReport {
            id: check_id,
            outcome: CheckOutcome::Changed(change),
            portal_latency_ms,
            checked_at: Utc::now(),
        })
    }
}
