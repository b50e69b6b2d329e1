//! 结果输出
//!
//! 把探测结果渲染为表格或JSON。所有渲染函数都写入调用方给出的 writer，
//! 是否着色由调用方根据终端状态决定。

use crate::health::{BatchReport, ProbeResult, ProbeStatus, ResultSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

/// 名称列最大字符数
const NAME_WIDTH: usize = 38;
/// 错误列最大字符数
const ERROR_WIDTH: usize = 30;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// 按字符截断，超出 `max` 时保留前 `max - 3` 个字符并追加 `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn status_icon(status: ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Healthy => "✓",
        ProbeStatus::Unhealthy => "✗",
        ProbeStatus::Timeout => "⏱",
        ProbeStatus::Error => "!",
    }
}

fn status_color(status: ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Healthy => GREEN,
        ProbeStatus::Timeout => YELLOW,
        ProbeStatus::Unhealthy | ProbeStatus::Error => RED,
    }
}

/// 渲染表格
///
/// # 参数
/// * `results` - 探测结果
/// * `unresolved` - 被中断而没有结果的目标名称
/// * `color` - 是否输出ANSI颜色
/// * `out` - 输出目标
pub fn render_table<W: Write>(
    results: &[ProbeResult],
    unresolved: &[String],
    color: bool,
    out: &mut W,
) -> io::Result<()> {
    writeln!(
        out,
        "{:<38}  {:<11}  {:>5}  {:>9}  ERROR",
        "NAME", "STATUS", "CODE", "LATENCY"
    )?;
    writeln!(out, "{}", "-".repeat(38 + 2 + 11 + 2 + 5 + 2 + 9 + 2 + ERROR_WIDTH))?;

    for result in results {
        let label = format!("{} {}", status_icon(result.status), result.status);
        // 先补齐宽度再着色，避免转义序列打乱对齐
        let label = format!("{label:<11}");
        let label = if color {
            format!("{}{label}{RESET}", status_color(result.status))
        } else {
            label
        };
        let code = result
            .status_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let latency = format!("{}ms", result.latency_ms());
        let error = truncate(result.error.as_deref().unwrap_or(""), ERROR_WIDTH);

        writeln!(
            out,
            "{:<38}  {}  {:>5}  {:>9}  {}",
            truncate(&result.name, NAME_WIDTH),
            label,
            code,
            latency,
            error
        )?;
    }

    let summary = ResultSummary::from_results(results);
    writeln!(out)?;
    writeln!(
        out,
        "{} total, {} healthy, {} unhealthy",
        summary.total, summary.healthy, summary.unhealthy
    )?;

    if !unresolved.is_empty() {
        writeln!(
            out,
            "interrupted: {} target(s) unresolved: {}",
            unresolved.len(),
            unresolved.join(", ")
        )?;
    }

    Ok(())
}

/// JSON输出结构
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub results: &'a [ProbeResult],
    pub summary: ResultSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self {
            timestamp: Utc::now(),
            results: &report.results,
            summary: report.summary(),
            unresolved: report.unresolved_names(),
        }
    }
}

/// 以缩进格式写出JSON报告
pub fn render_json<W: Write>(report: &JsonReport<'_>, out: &mut W) -> crate::error::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
