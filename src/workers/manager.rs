// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::profile_repository::ProfileRepository;
use crate::domain::services::notifier::SyncNotifier;
use crate::domain::services::sync_engine::SyncEngine;
use crate::queue::sync_queue::JobQueue;
use crate::workers::background::BackgroundPool;
use crate::workers::sync_worker::SyncWorker;
use crate::workers::worker::Worker;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager<Q, R>
where
    Q: JobQueue + 'static,
    R: ProfileRepository + 'static,
{
    queue: Arc<Q>,
    repository: Arc<R>,
    engine: Arc<SyncEngine>,
    notifier: Arc<dyn SyncNotifier>,
    background: BackgroundPool,
    job_timeout: Duration,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl<Q, R> WorkerManager<Q, R>
where
    Q: JobQueue + 'static,
    R: ProfileRepository + 'static,
{
    pub fn new(
        queue: Arc<Q>,
        repository: Arc<R>,
        engine: Arc<SyncEngine>,
        notifier: Arc<dyn SyncNotifier>,
        background: BackgroundPool,
        job_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            repository,
            engine,
            notifier,
            background,
            job_timeout,
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// 根取消令牌，取消后所有工作器及其进行中的请求都会停止
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = SyncWorker::new(
                self.queue.clone(),
                self.repository.clone(),
                self.engine.clone(),
                self.notifier.clone(),
                self.background.clone(),
                self.job_timeout,
            );

            let shutdown = self.shutdown.clone();
            let handle = tokio::spawn(async move {
                worker.run(shutdown).await;
            });
            self.handles.push(handle);
        }
        info!("Started {} sync workers", count);
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 停止所有工作进程
    ///
    /// 关闭队列并取消根令牌，然后等待工作进程退出
    pub async fn shutdown(&mut self) {
        info!("Shutting down workers...");
        self.queue.close();
        self.shutdown.cancel();

        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                error!("Worker task ended abnormally: {}", e);
            }
        }

        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        self.shutdown().await;
    }
}
