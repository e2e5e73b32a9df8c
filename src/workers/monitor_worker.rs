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

use crate::config::settings::MonitorSettings;
use crate::domain::models::status::CheckReport;
use crate::domain::repositories::status_repository::StatusRepository;
use crate::domain::services::monitor_service::{MonitorError, MonitorService};
use crate::domain::services::notification_service::Notifier;
use crate::engines::health_monitor::PortalHealthMonitor;
use crate::engines::traits::StatusProbe;
use crate::utils::errors::WorkerError;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{error, info, warn};

/// 监控工作器
///
/// 按固定间隔驱动检查周期。每个周期受总超时约束（对应CI任务的
/// 5分钟预算），周期内的瞬时探测故障按重试策略退避重试
pub struct MonitorWorker<P, R, N>
where
    P: StatusProbe,
    R: StatusRepository,
    N: Notifier,
{
    /// 监控服务
    service: Arc<MonitorService<P, R, N>>,
    /// 门户健康监控器
    health: Arc<PortalHealthMonitor>,
    /// 重试策略
    policy: RetryPolicy,
    /// 检查间隔
    check_interval: Duration,
    /// 单周期超时
    cycle_timeout: Duration,
}

impl<P, R, N> MonitorWorker<P, R, N>
where
    P: StatusProbe,
    R: StatusRepository,
    N: Notifier,
{
    /// 创建新的监控工作器实例
    ///
    /// # 参数
    ///
    /// * `service` - 监控服务
    /// * `health` - 门户健康监控器
    /// * `settings` - 监控配置
    pub fn new(
        service: Arc<MonitorService<P, R, N>>,
        health: Arc<PortalHealthMonitor>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            service,
            health,
            policy: RetryPolicy::monitor_cycle(settings.max_retries),
            check_interval: Duration::from_secs(settings.interval_secs),
            cycle_timeout: Duration::from_secs(settings.cycle_timeout_secs),
        }
    }

    /// 单次检查尝试：前置健康检查 + 完整检查
    async fn attempt(&self) -> Result<CheckReport, MonitorError> {
        self.health.preflight().await?;
        self.service.check_once().await
    }

    /// 执行一个检查周期（含周期内重试，不含周期超时）
    async fn run_cycle(&self) -> Result<CheckReport, WorkerError> {
        let mut attempt_count: u32 = 0;

        loop {
            match self.attempt().await {
                Ok(report) => return Ok(report),
                Err(e) if e.is_retryable() && self.policy.should_retry(attempt_count) => {
                    attempt_count += 1;
                    let backoff = self.policy.calculate_backoff(attempt_count);
                    warn!(
                        "Check attempt {} failed ({}), retrying in {:?}",
                        attempt_count, e, backoff
                    );
                    counter!("status_check_retries_total").increment(1);
                    sleep(backoff).await;
                }
                Err(MonitorError::Engine(e)) => {
                    return Err(WorkerError::EngineError(e.to_string()))
                }
                Err(MonitorError::Repository(e)) => {
                    return Err(WorkerError::RepositoryError(e.to_string()))
                }
                Err(MonitorError::Notify(e)) => {
                    return Err(WorkerError::NotifyError(e.to_string()))
                }
            }
        }
    }

    /// 执行单个受超时约束的检查周期
    ///
    /// `check`子命令直接调用此方法，其结果决定进程退出码
    ///
    /// # 返回值
    ///
    /// * `Ok(CheckReport)` - 本周期的检查报告
    /// * `Err(WorkerError)` - 检查失败或周期超时
    pub async fn run_once(&self) -> Result<CheckReport, WorkerError> {
        let started = std::time::Instant::now();
        counter!("status_check_cycles_total").increment(1);

        let result = match timeout(self.cycle_timeout, self.run_cycle()).await {
            Ok(result) => result,
            Err(_) => {
                counter!("status_check_failures_total", "reason" => "timeout").increment(1);
                Err(WorkerError::CycleTimeout(self.cycle_timeout.as_secs()))
            }
        };

        histogram!("status_check_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => {
                counter!("status_check_success_total").increment(1);
                if report.changed() {
                    info!("Check cycle {} detected a status change", report.id);
                }
            }
            Err(WorkerError::CycleTimeout(_)) => {}
            Err(_) => {
                counter!("status_check_failures_total", "reason" => "error").increment(1);
            }
        }

        result
    }
}

#[async_trait]
impl<P, R, N> Worker for MonitorWorker<P, R, N>
where
    P: StatusProbe,
    R: StatusRepository,
    N: Notifier,
{
    /// 运行监控循环
    ///
    /// 启动后立即执行首个周期，之后按检查间隔持续运行；
    /// 单个周期的失败只记录日志，不会中断循环
    async fn run(&self) -> Result<(), WorkerError> {
        info!(
            "Monitor worker started (interval: {:?}, cycle timeout: {:?})",
            self.check_interval, self.cycle_timeout
        );

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.run_once().await {
                Ok(report) => {
                    if !report.changed() {
                        info!("Check cycle {} completed, no change", report.id);
                    }
                }
                Err(e) => error!("Check cycle failed: {}", e),
            }
        }
    }

    fn name(&self) -> &str {
        "monitor"
    }
}
