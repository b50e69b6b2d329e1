//! Pinger - 并发端点探测工具
//!
//! 对一组 HTTP/TCP/DNS 端点做一次性健康探测：
//! - 固定数量的 worker 并发执行探测，每个目标有独立的超时
//! - 每个目标恰好产生一个结果，中断时未完成的目标单独列出
//! - TOML 配置，支持环境变量替换
//! - 表格或 JSON 输出

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod output;

// 重新导出主要类型
pub use config::{CheckType, Config, GlobalConfig, Target};
pub use error::PingerError;
pub use health::{BatchReport, BatchRunner, HealthChecker, ProbeResult, ProbeStatus, RunSettings};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
