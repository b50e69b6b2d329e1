//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::logging::LogConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pinger - 并发的 HTTP/TCP/DNS 端点探测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pinger",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "PINGER_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的值
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "PINGER_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 是否启用详细输出
    #[arg(short, long, help = "启用详细输出（等同于 --log-level debug）")]
    pub verbose: bool,

    /// 日志文件，未指定时写到 stderr
    #[arg(long, value_name = "FILE", help = "日志文件路径", env = "PINGER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// 日志格式
    #[arg(
        long,
        value_enum,
        default_value = "text",
        help = "日志格式",
        env = "PINGER_LOG_FORMAT"
    )]
    pub log_format: OutputFormat,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 探测一组端点并输出结果
    Check {
        /// 要探测的URL，指定后忽略配置文件
        #[arg(value_name = "URL", help = "要探测的URL（HTTP）")]
        urls: Vec<String>,

        /// 并发数
        #[arg(
            short = 'n',
            long,
            value_name = "COUNT",
            help = "并发探测数（默认使用配置值或10）"
        )]
        concurrency: Option<usize>,

        /// 超时时间（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            help = "每个目标的超时时间（秒，默认使用配置值或5）"
        )]
        timeout: Option<u64>,

        /// 以JSON输出
        #[arg(long, help = "以JSON格式输出")]
        json: bool,

        /// 按输入顺序输出
        #[arg(long, help = "按输入顺序而非完成顺序输出")]
        ordered: bool,
    },

    /// 初始化配置文件
    Init {
        /// 配置文件路径
        #[arg(
            value_name = "FILE",
            help = "配置文件路径",
            default_value = crate::config::loader::DEFAULT_CONFIG_FILE
        )]
        config_path: PathBuf,

        /// 是否覆盖现有文件
        #[arg(short, long, help = "覆盖现有文件")]
        force: bool,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,

        /// 是否显示详细信息
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }

    /// 命令行指定的日志级别，`--verbose` 优先
    pub fn requested_log_level(&self) -> Option<log::LevelFilter> {
        if self.verbose {
            Some(log::LevelFilter::Debug)
        } else {
            self.log_level.map(Into::into)
        }
    }

    /// 按命令行选项构建日志配置
    pub fn log_config(&self, level: log::LevelFilter) -> LogConfig {
        LogConfig {
            level,
            file_path: self.log_file.clone(),
            json_format: self.log_format == OutputFormat::Json,
        }
    }
}
