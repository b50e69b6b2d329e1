//! 探测结果数据结构
//!
//! 定义单次探测的结果类型和状态枚举

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 探测状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// 成功判定成立
    Healthy,
    /// 操作完成但成功判定不成立
    Unhealthy,
    /// 探测自身的截止时间先到
    Timeout,
    /// 无法发起或完成请求
    Error,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Healthy => write!(f, "healthy"),
            ProbeStatus::Unhealthy => write!(f, "unhealthy"),
            ProbeStatus::Timeout => write!(f, "timeout"),
            ProbeStatus::Error => write!(f, "error"),
        }
    }
}

impl ProbeStatus {
    /// 判断状态是否为健康
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeStatus::Healthy)
    }
}

/// 单次探测的结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// 目标名称
    pub name: String,
    /// 目标地址
    pub url: String,
    /// 探测状态
    pub status: ProbeStatus,
    /// HTTP状态码（仅HTTP探测且收到响应时）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 网络操作耗时
    #[serde(rename = "latency_ms", with = "duration_serde")]
    pub latency: Duration,
    /// 错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 探测开始时间
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    /// 创建新的探测结果
    pub fn new(name: impl Into<String>, url: impl Into<String>, status: ProbeStatus) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            status,
            status_code: None,
            latency: Duration::ZERO,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// 设置状态
    pub fn with_status(mut self, status: ProbeStatus) -> Self {
        self.status = status;
        self
    }

    /// 设置HTTP状态码
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// 设置耗时
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 设置错误信息
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// 设置时间戳
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 是否健康
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// 获取耗时（毫秒）
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

/// Duration序列化模块，以毫秒整数表示
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// 一批结果的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// 结果总数
    pub total: usize,
    /// 健康数
    pub healthy: usize,
    /// 非健康数（unhealthy / timeout / error）
    pub unhealthy: usize,
}

impl ResultSummary {
    /// 从结果列表统计
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let healthy = results.iter().filter(|r| r.is_healthy()).count();
        Self {
            total: results.len(),
            healthy,
            unhealthy: results.len() - healthy,
        }
    }

    /// 是否全部健康
    pub fn all_healthy(&self) -> bool {
        self.unhealthy == 0
    }
}
