//! TCP探测策略

use crate::config::Target;
use crate::health::checker::HealthChecker;
use crate::health::result::{ProbeResult, ProbeStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP探测器，建连成功即健康，连接随后立即关闭
pub struct TcpChecker;

impl TcpChecker {
    /// 在截止时间内等待建连并判定状态
    pub(crate) async fn check_with<F, S>(
        target: &Target,
        timeout_duration: Duration,
        connect: F,
    ) -> ProbeResult
    where
        F: Future<Output = io::Result<S>>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let connect = timeout(timeout_duration, connect).await;
        let latency = start.elapsed();

        let result = ProbeResult::new(target.name.clone(), target.url.clone(), ProbeStatus::Healthy)
            .with_timestamp(started_at)
            .with_latency(latency);

        match connect {
            Ok(Ok(stream)) => {
                drop(stream);
                result
            }
            Ok(Err(e)) => result
                .with_status(ProbeStatus::Unhealthy)
                .with_error(e.to_string()),
            Err(_) => result
                .with_status(ProbeStatus::Timeout)
                .with_error("connection timed out"),
        }
    }
}

#[async_trait]
impl HealthChecker for TcpChecker {
    async fn check(&self, target: &Target, timeout_duration: Duration) -> ProbeResult {
        let connect = TcpStream::connect(target.url.as_str());
        Self::check_with(target, timeout_duration, connect).await
    }
}
