//! 测试用的脚本化探测器
//!
//! 按目标 url 的前缀决定行为：
//! - `healthy` / `unhealthy` / `error`：立即返回对应状态
//! - `slow:<ms>`：等待指定毫秒后返回健康
//! - `deadline`：等满传入的超时后返回 `timeout`，与真实策略一样
//! - `hang`：永不返回，由调用方的截止时间兜底

use crate::config::{CheckType, Target};
use crate::health::checker::HealthChecker;
use crate::health::result::{ProbeResult, ProbeStatus};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub(crate) struct ScriptedChecker {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedChecker {
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthChecker for ScriptedChecker {
    async fn check(&self, target: &Target, timeout: Duration) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let start = Instant::now();
        let status = if let Some(ms) = target.url.strip_prefix("slow:") {
            let ms = ms.parse().unwrap_or(10);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ProbeStatus::Healthy
        } else if target.url.starts_with("deadline") {
            tokio::time::sleep(timeout).await;
            return ProbeResult::new(target.name.clone(), target.url.clone(), ProbeStatus::Timeout)
                .with_latency(start.elapsed())
                .with_error("request timed out");
        } else if target.url.starts_with("hang") {
            std::future::pending::<()>().await;
            unreachable!()
        } else if target.url.starts_with("unhealthy") {
            ProbeStatus::Unhealthy
        } else if target.url.starts_with("error") {
            ProbeStatus::Error
        } else {
            ProbeStatus::Healthy
        };

        ProbeResult::new(target.name.clone(), target.url.clone(), status).with_latency(start.elapsed())
    }
}

pub(crate) fn scripted_target(name: &str, url: &str, timeout: Duration) -> Target {
    Target::new(name, url, CheckType::Http, timeout)
}
