//! 批量探测
//!
//! 为一组目标启动 worker 池，按提交顺序投递任务，收集全部结果后返回。
//! `BatchReport::results` 为完成顺序，需要输入顺序时使用
//! [`BatchReport::into_submission_order`]。

use crate::config::types::DEFAULT_CONCURRENCY;
use crate::config::Target;
use crate::error::{ConfigError, ProbeError, Result};
use crate::health::checker::{HealthChecker, ProbeDispatcher};
use crate::health::pool::{Job, JobOutcome, WorkerPool};
use crate::health::result::{ProbeResult, ResultSummary};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 单次批量运行的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// 并发 worker 数量
    pub concurrency: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl RunSettings {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }
}

/// 批量运行的结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// 按完成顺序排列的结果
    pub results: Vec<ProbeResult>,
    /// 与 `results` 一一对应的提交序号
    indices: Vec<usize>,
    /// 取消时未产生结果的目标，按提交顺序排列
    pub unresolved: Vec<Target>,
    /// 整批耗时
    pub elapsed: Duration,
}

impl BatchReport {
    /// 结果统计
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    /// 全部结果健康且没有未完成的目标
    pub fn all_healthy(&self) -> bool {
        self.unresolved.is_empty() && self.summary().all_healthy()
    }

    /// 运行是否被中断
    pub fn is_partial(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// 未完成目标的名称
    pub fn unresolved_names(&self) -> Vec<String> {
        self.unresolved.iter().map(|t| t.name.clone()).collect()
    }

    /// 按提交顺序重新排列结果
    pub fn into_submission_order(mut self) -> Self {
        let mut paired: Vec<(usize, ProbeResult)> =
            self.indices.drain(..).zip(self.results.drain(..)).collect();
        paired.sort_by_key(|(index, _)| *index);
        let (indices, results) = paired.into_iter().unzip();
        self.indices = indices;
        self.results = results;
        self
    }
}

/// 批量探测器
pub struct BatchRunner {
    checker: Arc<dyn HealthChecker>,
}

impl BatchRunner {
    /// 使用内置的 HTTP/TCP/DNS 探测策略创建
    pub fn new() -> Result<Self> {
        Ok(Self::with_checker(Arc::new(ProbeDispatcher::new()?)))
    }

    /// 使用指定的探测策略创建
    pub fn with_checker(checker: Arc<dyn HealthChecker>) -> Self {
        Self { checker }
    }

    /// 探测所有目标，直到每个目标都产生结果
    pub async fn run(&self, targets: &[Target], settings: &RunSettings) -> Result<BatchReport> {
        self.run_until_cancelled(targets, settings, CancellationToken::new())
            .await
    }

    /// 探测所有目标，`token` 被取消时提前结束
    ///
    /// 提前结束时，尚未产生结果的目标记入 `BatchReport::unresolved`
    ///
    /// # 错误
    /// 目标列表为空或并发数为0时返回配置错误，此时不会发起任何探测
    pub async fn run_until_cancelled(
        &self,
        targets: &[Target],
        settings: &RunSettings,
        token: CancellationToken,
    ) -> Result<BatchReport> {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets.into());
        }
        if settings.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency must be greater than 0".to_string(),
            )
            .into());
        }

        // 多于目标数的 worker 只会空等
        let workers = settings.concurrency.min(targets.len());
        let start = Instant::now();
        info!(
            "开始批量探测，目标数量: {}，并发数: {}",
            targets.len(),
            workers
        );

        let (pool, results_rx) = WorkerPool::start(workers, Arc::clone(&self.checker), &token);
        let collector = tokio::spawn(collect(results_rx, targets.len()));

        let mut submitted = 0;
        for (index, target) in targets.iter().enumerate() {
            if !pool
                .submit(Job {
                    index,
                    target: target.clone(),
                })
                .await
            {
                break;
            }
            submitted += 1;
        }
        debug!("已提交 {}/{} 个任务", submitted, targets.len());

        if pool.is_cancelled() {
            pool.stop().await;
        } else {
            pool.shutdown().await;
        }

        let outcomes = collector
            .await
            .map_err(|e| ProbeError::Runtime(e.to_string()))?;

        let report = assemble(targets, outcomes, start.elapsed());
        if report.is_partial() {
            warn!(
                "批量探测被中断，完成 {} 个，未完成 {} 个",
                report.results.len(),
                report.unresolved.len()
            );
        } else {
            let summary = report.summary();
            info!(
                "批量探测完成，健康: {}/{}，耗时: {:?}",
                summary.healthy, summary.total, report.elapsed
            );
        }

        Ok(report)
    }
}

/// 收集结果直到结果队列关闭
async fn collect(mut rx: mpsc::Receiver<JobOutcome>, expected: usize) -> Vec<JobOutcome> {
    let mut outcomes = Vec::with_capacity(expected);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}

fn assemble(targets: &[Target], outcomes: Vec<JobOutcome>, elapsed: Duration) -> BatchReport {
    let mut resolved = vec![false; targets.len()];
    let mut results = Vec::with_capacity(outcomes.len());
    let mut indices = Vec::with_capacity(outcomes.len());

    for JobOutcome { index, result } in outcomes {
        match resolved.get_mut(index) {
            Some(seen) if !*seen => {
                *seen = true;
                indices.push(index);
                results.push(result);
            }
            _ => warn!("忽略重复或越界的结果: index={}", index),
        }
    }

    let unresolved = targets
        .iter()
        .zip(&resolved)
        .filter(|(_, seen)| !**seen)
        .map(|(target, _)| target.clone())
        .collect();

    BatchReport {
        results,
        indices,
        unresolved,
        elapsed,
    }
}
