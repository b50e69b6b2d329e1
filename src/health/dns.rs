//! DNS探测策略
//!
//! 解析目标主机名，至少得到一个地址即为健康。目标若带有 scheme
//! （例如 `https://example.com/health`），只解析其中的主机部分。

use crate::config::Target;
use crate::health::checker::HealthChecker;
use crate::health::result::{ProbeResult, ProbeStatus};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::lookup_host;
use tokio::time::timeout;

/// DNS探测器
pub struct DnsChecker;

impl DnsChecker {
    /// 提取要解析的主机名
    fn hostname(target: &Target) -> String {
        let host = if target.url.contains("://") {
            Url::parse(&target.url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
                .unwrap_or_else(|| target.url.clone())
        } else {
            target.url.clone()
        };

        host.trim_start_matches('[').trim_end_matches(']').to_string()
    }

    /// 解析主机名，返回去重后的地址列表
    async fn resolve(host: &str) -> io::Result<Vec<IpAddr>> {
        let mut addrs: Vec<IpAddr> = lookup_host((host, 0)).await?.map(|a| a.ip()).collect();
        addrs.sort();
        addrs.dedup();
        Ok(addrs)
    }

    /// 根据解析结果判定状态
    fn evaluate(result: ProbeResult, lookup: io::Result<Vec<IpAddr>>) -> ProbeResult {
        match lookup {
            Ok(addrs) if addrs.is_empty() => result
                .with_status(ProbeStatus::Unhealthy)
                .with_error("no addresses found"),
            Ok(addrs) => {
                tracing::trace!(name = %result.name, addresses = ?addrs, "DNS解析完成");
                result
            }
            Err(e) => result
                .with_status(ProbeStatus::Unhealthy)
                .with_error(e.to_string()),
        }
    }

    /// 在截止时间内等待解析并判定状态
    pub(crate) async fn check_with<F>(
        target: &Target,
        timeout_duration: Duration,
        lookup: F,
    ) -> ProbeResult
    where
        F: Future<Output = io::Result<Vec<IpAddr>>>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let lookup = timeout(timeout_duration, lookup).await;
        let latency = start.elapsed();

        let result = ProbeResult::new(target.name.clone(), target.url.clone(), ProbeStatus::Healthy)
            .with_timestamp(started_at)
            .with_latency(latency);

        match lookup {
            Ok(lookup) => Self::evaluate(result, lookup),
            Err(_) => result
                .with_status(ProbeStatus::Timeout)
                .with_error("DNS lookup timed out"),
        }
    }
}

#[async_trait]
impl HealthChecker for DnsChecker {
    async fn check(&self, target: &Target, timeout_duration: Duration) -> ProbeResult {
        let host = Self::hostname(target);
        Self::check_with(target, timeout_duration, Self::resolve(&host)).await
    }
}
