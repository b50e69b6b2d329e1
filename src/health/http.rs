//! HTTP探测策略
//!
//! 对目标发起一次 GET 请求，状态码等于期望值即为健康

use crate::config::Target;
use crate::error::{ProbeError, Result};
use crate::health::checker::{error_chain, HealthChecker};
use crate::health::result::{ProbeResult, ProbeStatus};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// HTTP探测器
pub struct HttpChecker {
    /// HTTP客户端，在所有探测间复用
    client: Client,
}

impl HttpChecker {
    /// 创建新的HTTP探测器
    ///
    /// 超时不在客户端上设置，而是由每次探测的截止时间控制；
    /// 探测直连目标，不读取代理环境变量
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .no_proxy()
            .build()
            .map_err(ProbeError::ClientBuild)?;

        Ok(Self { client })
    }

    /// 构建请求，URL或请求头非法时返回错误
    fn build_request(&self, target: &Target) -> reqwest::Result<reqwest::Request> {
        let mut request = self.client.get(&target.url);

        for (key, value) in &target.headers {
            request = request.header(key, value);
        }

        request.build()
    }
}

#[async_trait]
impl HealthChecker for HttpChecker {
    async fn check(&self, target: &Target, timeout_duration: Duration) -> ProbeResult {
        let started_at = Utc::now();
        let base = |status| {
            ProbeResult::new(target.name.clone(), target.url.clone(), status)
                .with_timestamp(started_at)
        };

        let request = match self.build_request(target) {
            Ok(request) => request,
            Err(e) => return base(ProbeStatus::Error).with_error(error_chain(&e)),
        };

        let start = Instant::now();
        let response = timeout(timeout_duration, self.client.execute(request)).await;
        let latency = start.elapsed();

        match response {
            Ok(Ok(response)) => {
                let status_code = response.status().as_u16();
                let result = base(ProbeStatus::Healthy)
                    .with_status_code(status_code)
                    .with_latency(latency);

                if status_code == target.expected_status {
                    result
                } else {
                    result
                        .with_status(ProbeStatus::Unhealthy)
                        .with_error("unexpected status code")
                }
            }
            Ok(Err(e)) if e.is_timeout() => base(ProbeStatus::Timeout)
                .with_latency(latency)
                .with_error("request timed out"),
            Ok(Err(e)) => base(ProbeStatus::Error)
                .with_latency(latency)
                .with_error(error_chain(&e)),
            Err(_) => base(ProbeStatus::Timeout)
                .with_latency(latency)
                .with_error("request timed out"),
        }
    }
}
