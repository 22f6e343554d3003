//! 延迟调度（DeferredScheduler）
//!
//! 异步适配器所需的“下一轮”调度协议与基于 tokio 的实现：
//! - `defer`：任务进入 FIFO 队列，由单个工作任务依次执行，绝不在调用方栈内同步执行；
//! - `defer_after`：延时到期后再入队，可通过 `CancellationToken` 取消；
//! - `flush`：等待调用前已入队的任务全部执行完毕。
//!
use async_trait::async_trait;
use emitter_core::{EmitterError, EmitterResult};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 延迟执行的任务
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// 延迟调度器：按入队顺序在之后的某一轮执行任务
#[async_trait]
pub trait DeferredScheduler: Send + Sync {
    /// 确认当前可以接收任务
    fn ready(&self) -> EmitterResult<()> {
        Ok(())
    }

    fn defer(&self, task: DeferredTask) -> EmitterResult<()>;

    /// 延时 `delay` 后入队；`token` 在到期前被取消则丢弃任务
    fn defer_after(
        &self,
        delay: Duration,
        token: CancellationToken,
        task: DeferredTask,
    ) -> EmitterResult<()>;

    /// 等待此前入队的任务全部执行完毕
    async fn flush(&self) -> EmitterResult<()> {
        let (tx, rx) = oneshot::channel();
        self.defer(Box::new(move || {
            let _ = tx.send(());
        }))?;
        rx.await
            .map_err(|_| EmitterError::scheduler("scheduler stopped before flush completed"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 正在运行的工作任务：入队端与其所在的运行时
struct Worker {
    tx: mpsc::UnboundedSender<DeferredTask>,
    runtime: Handle,
    handle: JoinHandle<()>,
}

/// 基于 tokio 的调度器
///
/// 工作任务在首次使用时启动于调用方所在的运行时，此后入队不再要求运行时上下文，
/// 非运行时线程上的同步分发同样可以推迟监听器调用。
/// 若该运行时已经关闭（例如跨测试共享同一个增强器），下一次入队会在当前运行时上
/// 重新启动工作任务；旧队列中尚未执行的任务随旧运行时一同丢失。
///
/// `shutdown`（以及调度器被释放时）只拒绝新任务，已入队的任务仍会依次执行完毕。
pub struct TokioScheduler {
    worker: Mutex<Option<Worker>>,
    token: CancellationToken,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            worker: Mutex::new(None),
            token: CancellationToken::new(),
        }
    }

    /// 停止接收新任务；工作任务执行完已入队的任务后退出
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待工作任务退出（需先调用 `shutdown`）
    pub async fn join(&self) {
        let worker = lock(&self.worker).take();
        if let Some(Worker { tx, handle, .. }) = worker {
            drop(tx);
            let _ = handle.await;
        }
    }

    /// 返回可用的入队端与运行时，必要时在当前运行时上启动工作任务
    fn worker(&self) -> EmitterResult<(mpsc::UnboundedSender<DeferredTask>, Handle)> {
        if self.token.is_cancelled() {
            return Err(EmitterError::scheduler("scheduler has been shut down"));
        }

        let mut slot = lock(&self.worker);
        if let Some(worker) = slot.as_ref().filter(|w| !w.tx.is_closed()) {
            return Ok((worker.tx.clone(), worker.runtime.clone()));
        }

        let runtime = Handle::try_current().map_err(|e| EmitterError::scheduler(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = runtime.spawn(Self::run(rx, self.token.clone()));
        if slot.is_some() {
            tracing::warn!("deferred task worker lost its runtime, restarted on the current one");
        } else {
            tracing::debug!("deferred task worker started");
        }
        *slot = Some(Worker {
            tx: tx.clone(),
            runtime: runtime.clone(),
            handle,
        });
        Ok((tx, runtime))
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<DeferredTask>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    // 拒绝新任务，但执行完已入队的任务
                    rx.close();
                    while let Some(task) = rx.recv().await {
                        Self::run_task(task);
                    }
                    break;
                }
                maybe_task = rx.recv() => match maybe_task {
                    Some(task) => Self::run_task(task),
                    None => break,
                },
            }
        }
        tracing::debug!("deferred task worker stopped");
    }

    fn run_task(task: DeferredTask) {
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(%reason, "deferred task panicked");
        }
    }
}

#[async_trait]
impl DeferredScheduler for TokioScheduler {
    fn ready(&self) -> EmitterResult<()> {
        self.worker().map(|_| ())
    }

    fn defer(&self, task: DeferredTask) -> EmitterResult<()> {
        let (tx, _) = self.worker()?;
        tx.send(task)
            .map_err(|_| EmitterError::scheduler("deferred task queue is closed"))
    }

    fn defer_after(
        &self,
        delay: Duration,
        token: CancellationToken,
        task: DeferredTask,
    ) -> EmitterResult<()> {
        let (tx, runtime) = self.worker()?;
        let shutdown = self.token.clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(task);
                }
            }
        });
        Ok(())
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
