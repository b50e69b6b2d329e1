//! Pinger 主程序入口
//!
//! 并发端点探测工具

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use pinger::cli::args::{Args, Commands};
use pinger::cli::commands::{
    CheckCommand, Command, CommandOutcome, InitCommand, ValidateCommand, VersionCommand,
};
use pinger::config::Config;
use pinger::logging::{parse_level, LoggingSystem};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = args.log_config(resolve_log_level(&args).await);
    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("Pinger v{} 启动", pinger::VERSION);
    if let Some(path) = &logging_system.config().file_path {
        debug!("日志写入文件: {}", path.display());
    }

    // 执行命令
    match execute_command(&args).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("命令执行失败: {:#}", e);
            eprintln!("错误: {e:#}");
            std::process::exit(1);
        }
    }
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<CommandOutcome> {
    let outcome = match &args.command {
        Commands::Check { .. } => {
            let cancel = CancellationToken::new();
            spawn_interrupt_handler(cancel.clone());
            CheckCommand::new(cancel).execute(args).await?
        }
        Commands::Init { .. } => InitCommand.execute(args).await?,
        Commands::Validate { .. } => ValidateCommand.execute(args).await?,
        Commands::Version { .. } => VersionCommand.execute(args).await?,
    };

    Ok(outcome)
}

/// Ctrl+C 时取消正在进行的探测，已完成的结果仍会输出
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("收到中断信号，正在停止探测...");
                cancel.cancel();
            }
            Err(err) => {
                error!("监听中断信号失败: {}", err);
            }
        }
    });
}

/// 确定日志级别
///
/// 命令行参数优先，其次是配置文件中的 `global.log_level`，默认 warn。
/// 这里只读取级别，配置错误留给具体命令报告。
async fn resolve_log_level(args: &Args) -> LevelFilter {
    if let Some(level) = args.requested_log_level() {
        return level;
    }

    let uses_config = match &args.command {
        Commands::Check { urls, .. } => urls.is_empty(),
        Commands::Validate { .. } => true,
        Commands::Init { .. } | Commands::Version { .. } => false,
    };
    if !uses_config {
        return LevelFilter::Warn;
    }

    let path = match &args.command {
        Commands::Validate {
            config_path: Some(path),
            ..
        } => path.clone(),
        _ => args.get_config_path(),
    };

    tokio::fs::read_to_string(&path)
        .await
        .ok()
        .and_then(|content| toml::from_str::<Config>(&content).ok())
        .and_then(|config| parse_level(&config.global.log_level))
        .unwrap_or(LevelFilter::Warn)
}
