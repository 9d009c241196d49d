//! 外部工具与并发资源的汇总

use crate::config::Config;
use crate::runner::{Runner, SystemRunner};
use crate::spice::metadata::{GitHistory, RevisionHistory};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

/// 有界工作池：同时运行的任务数不超过 permits
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
        }
    }

    /// 按 CPU 数量确定大小
    pub fn with_available_parallelism() -> Self {
        let size = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(size)
    }

    /// 在池中运行阻塞任务
    pub fn spawn_blocking<F, T>(&self, f: F) -> JoinHandle<Result<T, tokio::task::JoinError>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            tokio::task::spawn_blocking(f).await
        })
    }

    /// 在池中运行异步任务，结果按完成顺序从 `set` 取出
    pub fn spawn_into<F>(&self, set: &mut JoinSet<F::Output>, fut: F)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = self.permits.clone();
        set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            fut.await
        });
    }
}

pub struct Toolchain {
    pub config: Config,
    pub runner: Arc<dyn Runner>,
    pub history: Arc<dyn RevisionHistory>,
    /// 翻译文件处理专用的池，与 spice 级别的池分开，避免互相占满
    pub catalog_pool: WorkerPool,
}

impl Toolchain {
    pub fn new(
        config: Config,
        runner: Arc<dyn Runner>,
        history: Arc<dyn RevisionHistory>,
        catalog_pool: WorkerPool,
    ) -> Self {
        Self {
            config,
            runner,
            history,
            catalog_pool,
        }
    }

    /// 使用真实子进程与 git 历史
    pub fn system(config: Config) -> Self {
        let history = Arc::new(GitHistory::new(config.tools.git.clone()));
        Self::new(
            config,
            Arc::new(SystemRunner),
            history,
            WorkerPool::with_available_parallelism(),
        )
    }
}
