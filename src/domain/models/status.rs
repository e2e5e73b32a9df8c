// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 状态快照
///
/// 表示对门户状态单元格的一次观测结果。`value`为去除首尾空白后的
/// 文本，当状态单元格缺失或不可读时为空字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// 观测到的状态文本（已去除首尾空白）
    pub value: String,
    /// 观测时间
    pub observed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// 创建新的状态快照
    ///
    /// # 参数
    ///
    /// * `value` - 原始状态文本，构造时去除首尾空白
    pub fn new(value: impl AsRef<str>) -> Self {
        Self {
            value: value.as_ref().trim().to_string(),
            observed_at: Utc::now(),
        }
    }

    /// 快照是否为空观测（单元格缺失或不可读）
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// 状态变更
///
/// 表示一次检测到的状态转换。首次观测时`previous`为空字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// 上次持久化的状态
    pub previous: String,
    /// 当前观测到的状态
    pub current: String,
    /// 观测时间
    pub observed_at: DateTime<Utc>,
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let previous = if self.previous.is_empty() {
            "[none]"
        } else {
            &self.previous
        };
        let current = if self.current.is_empty() {
            "[empty]"
        } else {
            &self.current
        };
        write!(f, "{} -> {}", previous, current)
    }
}

/// 检查结果枚举
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckOutcome {
    /// 状态未变化
    Unchanged,
    /// 检测到状态变更
    Changed(StatusChange),
}

/// 检查报告
///
/// 单个检查周期的可序列化摘要，用于日志关联和`check --json`输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// 检查唯一标识符
    pub id: Uuid,
    /// 检查结果
    pub outcome: CheckOutcome,
    /// 门户探测耗时（毫秒）
    pub portal_latency_ms: u64,
    /// 检查完成时间
    pub checked_at: DateTime<Utc>,
}

impl CheckReport {
    /// 本次检查是否检测到状态变更
    pub fn changed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Changed(_))
    }
}
