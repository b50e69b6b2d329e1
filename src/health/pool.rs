//! 探测 worker 池
//!
//! 固定数量的 worker 共享一个有界任务队列（接收端由互斥锁保护）和一个
//! 有界结果队列，并共用一个取消令牌。
//!
//! ```text
//! submit ──► [job queue] ──► worker × N ──► HealthChecker ──► [result queue] ──► collector
//!                               ▲
//!                               └── CancellationToken
//! ```
//!
//! 生命周期：
//! - `start` 启动 N 个 worker，每个 worker 阻塞等待任务或取消
//! - `shutdown` 关闭任务入口，等待 worker 处理完队列后退出
//! - `stop` 先触发取消，再关闭入口并等待 worker 退出，队列中剩余任务被放弃
//!
//! 两者都会消耗 pool 本身；所有 worker 退出后结果队列随之关闭。

use crate::config::Target;
use crate::health::checker::HealthChecker;
use crate::health::result::{ProbeResult, ProbeStatus};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 一次提交的探测任务
#[derive(Debug, Clone)]
pub struct Job {
    /// 提交序号
    pub index: usize,
    /// 探测目标
    pub target: Target,
}

/// worker 发布的结果，携带对应任务的提交序号
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// 提交序号
    pub index: usize,
    /// 探测结果
    pub result: ProbeResult,
}

/// 探测 worker 池
pub struct WorkerPool {
    job_tx: mpsc::Sender<Job>,
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// 启动 worker 池
    ///
    /// # 参数
    /// * `workers` - worker 数量，队列容量为其两倍
    /// * `checker` - 探测策略
    /// * `parent` - 外部取消令牌，取消它会同时取消本池
    ///
    /// # 返回
    /// * `(WorkerPool, mpsc::Receiver<JobOutcome>)` - 池本身与结果接收端
    pub fn start(
        workers: usize,
        checker: Arc<dyn HealthChecker>,
        parent: &CancellationToken,
    ) -> (Self, mpsc::Receiver<JobOutcome>) {
        // 通道容量必须在 1..=MAX_PERMITS 之内
        let workers = workers.clamp(1, Semaphore::MAX_PERMITS / 2);
        let capacity = workers.saturating_mul(2);

        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<JobOutcome>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let cancel = parent.child_token();

        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&checker),
                    Arc::clone(&job_rx),
                    result_tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        info!("探测 worker 池已启动，worker 数量: {}", workers);

        (
            Self {
                job_tx,
                handles,
                cancel,
            },
            result_rx,
        )
    }

    /// 提交任务，队列满时等待
    ///
    /// 池已取消时任务被丢弃，返回 `false`
    pub async fn submit(&self, job: Job) -> bool {
        let name = job.target.name.clone();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("池已取消，丢弃任务: {}", name);
                false
            }
            sent = self.job_tx.send(job) => sent.is_ok(),
        }
    }

    /// 池是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// worker 数量
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// 关闭任务入口，等待 worker 处理完剩余任务后退出
    pub async fn shutdown(self) {
        let WorkerPool {
            job_tx, handles, ..
        } = self;
        drop(job_tx);
        Self::join_workers(handles).await;
        debug!("探测 worker 池已排空");
    }

    /// 取消所有 worker，关闭任务入口并等待其退出
    pub async fn stop(self) {
        self.cancel.cancel();
        let WorkerPool {
            job_tx, handles, ..
        } = self;
        drop(job_tx);
        Self::join_workers(handles).await;
        info!("探测 worker 池已停止");
    }

    async fn join_workers(handles: Vec<JoinHandle<()>>) {
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("worker 异常退出: {}", e);
            }
        }
    }
}

/// worker 主循环
async fn worker_loop(
    id: usize,
    checker: Arc<dyn HealthChecker>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<JobOutcome>,
    cancel: CancellationToken,
) {
    debug!(worker = id, "worker 启动");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = async { jobs.lock().await.recv().await } => job,
        };

        // 入口已关闭且队列为空
        let Some(Job { index, target }) = next else {
            break;
        };

        debug!(worker = id, name = %target.name, url = %target.url, "开始探测");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = run_with_deadline(checker.as_ref(), &target) => result,
        };

        if result.is_healthy() {
            debug!(worker = id, name = %result.name, latency_ms = result.latency_ms(), "探测正常");
        } else {
            warn!(
                worker = id,
                name = %result.name,
                status = %result.status,
                "探测失败: {}",
                result.error.as_deref().unwrap_or("N/A")
            );
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = results.send(JobOutcome { index, result }) => {
                if sent.is_err() {
                    warn!(worker = id, "结果接收端已关闭");
                    break;
                }
            }
        }
    }

    debug!(worker = id, "worker 退出");
}

/// 兜底截止时间比目标超时多出的余量，策略自身的超时总是先触发
const DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// 在目标自身的截止时间内执行探测
///
/// 策略内部受 `target.timeout` 约束并给出各自的超时信息；这里的兜底
/// 只在策略不守约时生效，保证 worker 不被卡住，结果记为 `timeout`。
async fn run_with_deadline(checker: &dyn HealthChecker, target: &Target) -> ProbeResult {
    let started_at = Utc::now();
    let start = Instant::now();
    let guard = target.timeout.saturating_add(DEADLINE_GRACE);

    match tokio::time::timeout(guard, checker.check(target, target.timeout)).await {
        Ok(result) => result,
        Err(_) => ProbeResult::new(target.name.clone(), target.url.clone(), ProbeStatus::Timeout)
            .with_timestamp(started_at)
            .with_latency(start.elapsed())
            .with_error("deadline exceeded"),
    }
}
