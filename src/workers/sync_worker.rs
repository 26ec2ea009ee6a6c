// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::sync_job::{JobStatus, SyncJob};
use crate::domain::repositories::profile_repository::ProfileRepository;
use crate::domain::services::notifier::{SyncNotification, SyncNotifier};
use crate::domain::services::sync_engine::SyncEngine;
use crate::infrastructure::metrics::{JOBS_COMPLETED, JOBS_FAILED, JOB_DURATION};
use crate::queue::sync_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::workers::background::BackgroundPool;
use crate::workers::worker::Worker;

/// 同步工作器
///
/// 从队列取任务，调用同步引擎并写入增量。失败只记录，不自动重试。
pub struct SyncWorker<Q, R>
where
    Q: JobQueue,
    R: ProfileRepository,
{
    queue: Arc<Q>,
    repository: Arc<R>,
    engine: Arc<SyncEngine>,
    notifier: Arc<dyn SyncNotifier>,
    background: BackgroundPool,
    job_timeout: Duration,
    worker_id: Uuid,
    name: String,
}

impl<Q, R> SyncWorker<Q, R>
where
    Q: JobQueue,
    R: ProfileRepository,
{
    /// 创建新的同步工作器实例
    pub fn new(
        queue: Arc<Q>,
        repository: Arc<R>,
        engine: Arc<SyncEngine>,
        notifier: Arc<dyn SyncNotifier>,
        background: BackgroundPool,
        job_timeout: Duration,
    ) -> Self {
        let worker_id = Uuid::new_v4();
        Self {
            queue,
            repository,
            engine,
            notifier,
            background,
            job_timeout,
            worker_id,
            name: format!("sync-worker-{}", worker_id),
        }
    }

    /// 处理单个任务并返回其终态
    ///
    /// `ctx` 是本任务专属的取消令牌，返回前总会被取消
    #[instrument(skip(self, job, ctx), fields(job_id = %job.id, user_id = %job.user_id, site = %job.site, action = %job.action))]
    pub async fn process_job(&self, mut job: SyncJob, ctx: CancellationToken) -> JobStatus {
        if let Err(e) = self.queue.mark_running(&mut job) {
            error!("Cannot start sync job: {}", e);
            if let Err(e) = self.queue.discard(&mut job, &e.to_string()) {
                error!("Failed to discard sync job: {}", e);
            }
            return job.status;
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.job_timeout, self.execute(&job, ctx.clone())).await;
        ctx.cancel();
        histogram!(JOB_DURATION).record(started.elapsed().as_secs_f64());

        let result = outcome.unwrap_or_else(|_| Err(WorkerError::Timeout(self.job_timeout)));
        match result {
            Ok(notification) => {
                if let Err(e) = self.queue.complete(&mut job) {
                    error!("Failed to mark sync job completed: {}", e);
                    return job.status;
                }
                counter!(JOBS_COMPLETED).increment(1);
                info!(
                    new_submissions = notification.new_submissions,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sync job completed"
                );

                let notifier = self.notifier.clone();
                self.background.submit("sync_notification", async move {
                    notifier.notify(&notification).await
                });
            }
            Err(e) => {
                counter!(JOBS_FAILED, "site" => job.site.clone()).increment(1);
                error!(retryable = e.is_retryable(), "Sync job failed: {}", e);
                if let Err(e) = self.queue.fail(&mut job, &e.to_string()) {
                    error!("Failed to mark sync job failed: {}", e);
                }
            }
        }
        job.status
    }

    async fn execute(
        &self,
        job: &SyncJob,
        ctx: CancellationToken,
    ) -> Result<SyncNotification, WorkerError> {
        let handle = self
            .repository
            .get_handle(job.user_id, &job.site)
            .await?
            .ok_or_else(|| WorkerError::NoHandle {
                site: job.site.clone(),
            })?;
        let cutoff = self
            .repository
            .get_last_sync_cutoff(job.user_id, &job.site)
            .await?;

        let result = self
            .engine
            .sync(job.user_id, &job.site, &handle, cutoff, job.action, ctx)
            .await?;

        let new_submissions = result.submissions.len();
        let rating_points = result.rating_history.as_ref().map(Vec::len);

        self.repository
            .upsert_profile(job.user_id, &result.site, result.profile)
            .await?;
        self.repository
            .append_submissions(job.user_id, &result.site, result.submissions)
            .await?;
        if let Some(history) = result.rating_history {
            self.repository
                .replace_rating_history(job.user_id, &result.site, history)
                .await?;
        }

        Ok(SyncNotification {
            user_id: job.user_id,
            site: result.site,
            handle: result.handle,
            new_submissions,
            rating_points,
        })
    }
}

#[async_trait]
impl<Q, R> Worker for SyncWorker<Q, R>
where
    Q: JobQueue,
    R: ProfileRepository,
{
    async fn run(&self, shutdown: CancellationToken) {
        info!("Sync worker {} started", self.worker_id);

        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                job = self.queue.dequeue() => job,
            };

            match job {
                Some(job) => {
                    self.process_job(job, shutdown.child_token()).await;
                }
                None => {
                    warn!("Sync queue closed, worker {} exiting", self.worker_id);
                    break;
                }
            }
        }

        info!("Sync worker {} stopped", self.worker_id);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
