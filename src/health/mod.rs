//! 健康探测模块
//!
//! 提供HTTP/TCP/DNS探测策略、并发 worker 池与批量运行器

pub mod checker;
pub mod dns;
pub mod http;
pub mod pool;
pub mod result;
pub mod runner;
pub mod tcp;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出主要类型
pub use checker::{HealthChecker, ProbeDispatcher};
pub use pool::{Job, JobOutcome, WorkerPool};
pub use result::{ProbeResult, ProbeStatus, ResultSummary};
pub use runner::{BatchReport, BatchRunner, RunSettings};
