//! 配置数据结构定义
//!
//! 定义配置文件结构体、探测目标以及验证逻辑

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 探测类型，集合是封闭的
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    /// HTTP GET
    #[default]
    Http,
    /// TCP 建连
    Tcp,
    /// DNS 解析
    Dns,
}

impl CheckType {
    /// 从名称映射探测类型，空值或未知值一律视为 HTTP
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tcp" => CheckType::Tcp,
            "dns" => CheckType::Dns,
            "" | "http" | "https" => CheckType::Http,
            other => {
                tracing::warn!("未知的探测类型 {:?}，按 http 处理", other);
                CheckType::Http
            }
        }
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckType::Http => write!(f, "http"),
            CheckType::Tcp => write!(f, "tcp"),
            CheckType::Dns => write!(f, "dns"),
        }
    }
}

impl<'de> Deserialize<'de> for CheckType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(CheckType::from_name(&name))
    }
}

/// 单个探测目标，构建完成后只读
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// 目标名称
    pub name: String,
    /// 地址：HTTP 为完整URL，TCP 为 host:port，DNS 为主机名
    pub url: String,
    /// 探测类型
    pub check_type: CheckType,
    /// 单次探测的截止时间
    pub timeout: Duration,
    /// 期望的HTTP状态码
    pub expected_status: u16,
    /// 请求头（仅HTTP）
    pub headers: HashMap<String, String>,
}

impl Target {
    /// 创建新的探测目标
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        check_type: CheckType,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            check_type,
            timeout,
            expected_status: DEFAULT_EXPECTED_STATUS,
            headers: HashMap::new(),
        }
    }

    /// 以URL为名称的HTTP目标，命令行直接传入URL时使用
    pub fn http(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        Self::new(url.clone(), url, CheckType::Http, timeout)
    }

    /// 设置期望状态码
    pub fn with_expected_status(mut self, expected_status: u16) -> Self {
        self.expected_status = expected_status;
        self
    }

    /// 添加请求头
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 探测目标列表
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 并发 worker 数
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 默认探测超时（秒）
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 全局请求头，目标自身的同名请求头优先
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout(),
            log_level: default_log_level(),
            headers: HashMap::new(),
        }
    }
}

/// 配置文件中的目标条目
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    /// 目标名称，缺省时使用url
    pub name: Option<String>,
    /// 目标地址
    #[serde(default)]
    pub url: String,
    /// 探测类型
    #[serde(rename = "type", default)]
    pub check_type: CheckType,
    /// 目标特定的超时（秒）
    pub timeout_seconds: Option<u64>,
    /// 期望的HTTP状态码
    pub expected_status: Option<u16>,
    /// 目标特定的请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// 默认期望状态码
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// 默认并发数
pub const DEFAULT_CONCURRENCY: usize = 10;

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_timeout() -> u64 {
    5
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// 将配置条目解析为探测目标，填充缺省值
    pub fn targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|entry| self.resolve_target(entry))
            .collect()
    }

    fn resolve_target(&self, entry: &TargetConfig) -> Target {
        let name = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&entry.url);
        let timeout_secs = entry
            .timeout_seconds
            .unwrap_or(self.global.timeout_seconds);

        let mut target = Target::new(
            name,
            entry.url.clone(),
            entry.check_type,
            Duration::from_secs(timeout_secs),
        )
        .with_expected_status(entry.expected_status.unwrap_or(DEFAULT_EXPECTED_STATUS));

        if entry.check_type == CheckType::Http {
            let mut headers = self.global.headers.clone();
            headers.extend(entry.headers.clone());
            target.headers = headers;
        }

        target
    }
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), ConfigError>` - 验证结果
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    validate_presence(config)?;

    for target in &config.targets {
        let label = target.name.as_deref().unwrap_or(&target.url);

        if target.timeout_seconds == Some(0) {
            return invalid(format!("目标 {label} 的超时时间不能为0"));
        }

        match target.check_type {
            CheckType::Http => {
                if !target.url.starts_with("http://") && !target.url.starts_with("https://") {
                    return invalid(format!("目标 {label} 的URL格式无效"));
                }
                if let Some(code) = target.expected_status {
                    if !(100..=599).contains(&code) {
                        return invalid(format!("目标 {label} 的状态码 {code} 无效"));
                    }
                }
            }
            CheckType::Tcp => {
                if !is_host_port(&target.url) {
                    return invalid(format!("目标 {label} 的地址必须是 host:port 格式"));
                }
            }
            CheckType::Dns => {
                if target.url.chars().any(char::is_whitespace) {
                    return invalid(format!("目标 {label} 的主机名无效"));
                }
            }
        }
    }

    Ok(())
}

/// 只验证全局配置和目标是否给出了URL
///
/// 地址格式不在这里检查，格式不对的目标照常探测并得到 `error` 结果
pub fn validate_presence(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if config.global.concurrency == 0 {
        return invalid("并发数不能为0".to_string());
    }

    if config.global.timeout_seconds == 0 {
        return invalid("超时时间不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return invalid(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    if config.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    if let Some(i) = config.targets.iter().position(|t| t.url.trim().is_empty()) {
        return invalid(format!("target {i}: url is required"));
    }

    Ok(())
}

fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && port.parse::<u16>().map(|p| p != 0).unwrap_or(false)
        }
        None => false,
    }
}
