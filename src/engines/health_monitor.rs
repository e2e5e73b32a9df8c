// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::engines::traits::EngineError;

/// 门户健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalHealth {
    /// 健康
    Healthy,
    /// 降级
    Degraded,
    /// 不可用
    Unhealthy,
}

/// 门户健康检查信息
#[derive(Debug, Clone)]
pub struct HealthCheckInfo {
    /// 健康状态
    pub health: PortalHealth,
    /// 最后检查时间
    pub last_check: DateTime<Utc>,
    /// 连续失败次数
    pub consecutive_failures: u32,
    /// 响应时间（毫秒）
    pub response_time_ms: Option<u64>,
    /// 错误信息
    pub error_message: Option<String>,
}

/// 健康检查配置
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// 超时时间
    pub timeout: Duration,
    /// 降级阈值（响应时间，毫秒）
    pub degraded_threshold_ms: u64,
    /// 最大连续失败次数
    pub max_consecutive_failures: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            degraded_threshold_ms: 5000,
            max_consecutive_failures: 3,
        }
    }
}

/// 门户健康监控器
///
/// 在启动浏览器周期之前对门户发起一次轻量HTTP探测，
/// 门户不可达时提前终止本周期，避免无谓的浏览器开销
pub struct PortalHealthMonitor {
    /// 门户URL
    target_url: String,
    /// HTTP客户端
    client: reqwest::Client,
    /// 最近一次检查信息
    latest: RwLock<Option<HealthCheckInfo>>,
    /// 配置
    config: HealthCheckConfig,
}

impl PortalHealthMonitor {
    /// 创建新的健康监控器
    pub fn new(target_url: impl Into<String>) -> Self {
        Self::new_with_config(target_url, HealthCheckConfig::default())
    }

    /// 使用自定义配置创建新的健康监控器
    pub fn new_with_config(target_url: impl Into<String>, config: HealthCheckConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            target_url: target_url.into(),
            client,
            latest: RwLock::new(None),
            config,
        }
    }

    /// 获取最近一次检查信息
    pub async fn latest(&self) -> Option<HealthCheckInfo> {
        self.latest.read().await.clone()
    }

    /// 执行一次健康检查
    ///
    /// # 返回值
    ///
    /// 本次检查的健康信息；检查结果同时记录在监控器内部状态中
    pub async fn check_now(&self) -> HealthCheckInfo {
        let previous_failures = self
            .latest
            .read()
            .await
            .as_ref()
            .map(|info| info.consecutive_failures)
            .unwrap_or(0);

        let start = Instant::now();
        let result = self.client.get(&self.target_url).send().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let info = match result {
            Ok(response) if response.status().is_server_error() => HealthCheckInfo {
                health: PortalHealth::Unhealthy,
                last_check: Utc::now(),
                consecutive_failures: previous_failures + 1,
                response_time_ms: Some(elapsed_ms),
                error_message: Some(format!("Server error: {}", response.status())),
            },
            Ok(_) => {
                let health = if elapsed_ms > self.config.degraded_threshold_ms {
                    PortalHealth::Degraded
                } else {
                    PortalHealth::Healthy
                };
                HealthCheckInfo {
                    health,
                    last_check: Utc::now(),
                    consecutive_failures: 0,
                    response_time_ms: Some(elapsed_ms),
                    error_message: None,
                }
            }
            Err(e) => HealthCheckInfo {
                health: PortalHealth::Unhealthy,
                last_check: Utc::now(),
                consecutive_failures: previous_failures + 1,
                response_time_ms: None,
                error_message: Some(e.to_string()),
            },
        };

        if info.health != PortalHealth::Healthy {
            warn!(
                "Portal health check: {:?} (failures: {}, error: {:?})",
                info.health, info.consecutive_failures, info.error_message
            );
        }

        *self.latest.write().await = Some(info.clone());
        info
    }

    /// 执行周期前置检查
    ///
    /// # 返回值
    ///
    /// * `Ok(HealthCheckInfo)` - 门户可达（含降级状态）
    /// * `Err(EngineError::Unavailable)` - 门户不可达
    pub async fn preflight(&self) -> Result<HealthCheckInfo, EngineError> {
        let info = self.check_now().await;
        if info.health == PortalHealth::Unhealthy {
            return Err(EngineError::Unavailable(
                info.error_message
                    .clone()
                    .unwrap_or_else(|| "portal unreachable".to_string()),
            ));
        }
        Ok(info)
    }
}
