//! 探测策略接口与分发
//!
//! 每种探测类型只执行一次网络操作，并把所有结局折叠进 [`ProbeResult`]。
//! 类型集合是封闭的：HTTP、TCP、DNS。

use crate::config::{CheckType, Target};
use crate::error::Result;
use crate::health::dns::DnsChecker;
use crate::health::http::HttpChecker;
use crate::health::result::ProbeResult;
use crate::health::tcp::TcpChecker;
use async_trait::async_trait;
use std::time::Duration;

/// 探测策略trait
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// 对目标执行一次探测
    ///
    /// # 参数
    /// * `target` - 探测目标
    /// * `timeout` - 本次探测的截止时间
    ///
    /// # 返回
    /// * `ProbeResult` - 探测结果，网络错误不会以 `Err` 形式返回
    async fn check(&self, target: &Target, timeout: Duration) -> ProbeResult;
}

/// 按目标类型分发到具体策略
pub struct ProbeDispatcher {
    http: HttpChecker,
    tcp: TcpChecker,
    dns: DnsChecker,
}

impl ProbeDispatcher {
    /// 创建分发器，HTTP客户端在此构建并在所有探测间复用
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpChecker::new()?,
            tcp: TcpChecker,
            dns: DnsChecker,
        })
    }

    /// 选择探测策略
    pub fn strategy_for(&self, check_type: CheckType) -> &dyn HealthChecker {
        match check_type {
            CheckType::Http => &self.http,
            CheckType::Tcp => &self.tcp,
            CheckType::Dns => &self.dns,
        }
    }
}

#[async_trait]
impl HealthChecker for ProbeDispatcher {
    async fn check(&self, target: &Target, timeout: Duration) -> ProbeResult {
        self.strategy_for(target.check_type)
            .check(target, timeout)
            .await
    }
}

/// 拼接错误及其来源链，便于在结果中展示完整原因
pub(crate) fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
