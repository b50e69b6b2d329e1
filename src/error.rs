//! 错误处理模块
//!
//! 定义应用程序的统一错误类型。探测过程中的网络错误不会出现在这里，
//! 它们全部折叠进 [`crate::health::ProbeResult`]。

use thiserror::Error;

/// Pinger 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum PingerError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测引擎相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 没有任何探测目标
    #[error("no targets defined")]
    NoTargets,
}

/// 探测引擎错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// 结果收集任务异常退出
    #[error("结果收集任务异常: {0}")]
    Runtime(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, PingerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: PingerError = ConfigError::NoTargets.into();
        assert!(matches!(err, PingerError::Config(ConfigError::NoTargets)));
        assert!(err.to_string().contains("no targets defined"));
    }

    #[test]
    fn test_env_var_error_message() {
        let err = ConfigError::EnvVarError {
            var: "API_TOKEN".to_string(),
        };
        assert!(err.to_string().contains("API_TOKEN"));
    }
}
