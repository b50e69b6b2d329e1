//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{
    validate_config, validate_presence, Config, ConfigLoader, TargetConfig, TomlConfigLoader,
};
use crate::error::{ConfigError, Result};
use crate::health::{BatchReport, BatchRunner, RunSettings};
use crate::output::{render_json, render_table, JsonReport};
use async_trait::async_trait;
use std::io::{IsTerminal, Write};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// 示例配置
pub const SAMPLE_CONFIG: &str = include_str!("../../demos/basic_config.toml");

/// 命令执行结局，决定进程退出码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 执行成功且全部目标健康
    Success,
    /// 执行完成，但存在非健康或未完成的目标
    Failure,
}

impl CommandOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandOutcome::Success => 0,
            CommandOutcome::Failure => 1,
        }
    }
}

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<CommandOutcome>;
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<CommandOutcome> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(CommandOutcome::Success)
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<CommandOutcome> {
        if let Commands::Init { config_path, force } = &args.command {
            self.create_config_file(config_path, *force).await
        } else {
            Ok(CommandOutcome::Success)
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<CommandOutcome> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(CommandOutcome::Failure);
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, SAMPLE_CONFIG).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加您的探测目标");

        Ok(CommandOutcome::Success)
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<CommandOutcome> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(CommandOutcome::Success)
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<CommandOutcome> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  并发数: {}", config.global.concurrency);
            println!("  超时时间: {}秒", config.global.timeout_seconds);
            println!("  日志级别: {}", config.global.log_level);

            println!("探测目标:");
            for (i, target) in config.targets().iter().enumerate() {
                println!("  {}. {} ({})", i + 1, target.name, target.url);
                println!("     类型: {}", target.check_type);
                println!("     超时: {}秒", target.timeout.as_secs());
                if target.check_type == crate::config::CheckType::Http {
                    println!("     期望状态码: {}", target.expected_status);
                    if !target.headers.is_empty() {
                        let mut names: Vec<&str> =
                            target.headers.keys().map(String::as_str).collect();
                        names.sort_unstable();
                        println!("     请求头: {}", names.join(", "));
                    }
                }
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个探测目标", config.targets.len());
        }

        Ok(CommandOutcome::Success)
    }
}

/// 探测命令
pub struct CheckCommand {
    /// 触发后停止探测并输出已有结果
    cancel: CancellationToken,
}

impl CheckCommand {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<CommandOutcome> {
        if let Commands::Check {
            urls,
            concurrency,
            timeout,
            json,
            ordered,
        } = &args.command
        {
            let config = self.resolve_config(args, urls, *concurrency, *timeout).await?;
            let report = self.perform_check(&config).await?;
            let report = if *ordered {
                report.into_submission_order()
            } else {
                report
            };

            let stdout = std::io::stdout();
            let color = stdout.is_terminal();
            let mut out = stdout.lock();
            if *json {
                render_json(&JsonReport::new(&report), &mut out)?;
            } else {
                render_table(&report.results, &report.unresolved_names(), color, &mut out)?;
            }
            out.flush()?;

            Ok(if report.all_healthy() {
                CommandOutcome::Success
            } else {
                CommandOutcome::Failure
            })
        } else {
            Ok(CommandOutcome::Success)
        }
    }
}

impl CheckCommand {
    /// 确定本次探测的配置
    ///
    /// 命令行给出URL时只使用这些URL，否则读取配置文件；
    /// `--concurrency` 与 `--timeout` 覆盖配置中的值。
    /// 命令行URL不做格式检查，无效地址在结果中显示为 `error`
    async fn resolve_config(
        &self,
        args: &Args,
        urls: &[String],
        concurrency: Option<usize>,
        timeout: Option<u64>,
    ) -> Result<Config> {
        let mut config = if !urls.is_empty() {
            config_from_urls(urls)
        } else {
            let path = args.get_config_path();
            if args.config.is_none() && !path.exists() {
                return Err(ConfigError::ValidationError("no targets specified".to_string()).into());
            }
            TomlConfigLoader::new(true).load_from_file(&path).await?
        };

        apply_overrides(&mut config, concurrency, timeout);
        if urls.is_empty() {
            validate_config(&config)?;
        } else {
            validate_presence(&config)?;
        }
        Ok(config)
    }

    /// 执行批量探测
    async fn perform_check(&self, config: &Config) -> Result<BatchReport> {
        let targets = config.targets();
        let settings = RunSettings::new(config.global.concurrency);
        let runner = BatchRunner::new()?;

        runner
            .run_until_cancelled(&targets, &settings, self.cancel.clone())
            .await
    }
}

/// 由命令行URL构建配置，全部作为HTTP目标
fn config_from_urls(urls: &[String]) -> Config {
    Config {
        targets: urls
            .iter()
            .map(|url| TargetConfig {
                url: url.clone(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// 应用命令行覆盖项
fn apply_overrides(config: &mut Config, concurrency: Option<usize>, timeout: Option<u64>) {
    if let Some(concurrency) = concurrency {
        config.global.concurrency = concurrency;
    }
    if let Some(timeout) = timeout {
        config.global.timeout_seconds = timeout;
        for target in &mut config.targets {
            target.timeout_seconds = None;
        }
    }
}
