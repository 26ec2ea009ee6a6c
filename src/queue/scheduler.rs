// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::sync_job::{JobAction, SyncJob};
use crate::domain::repositories::profile_repository::ProfileRepository;
use crate::queue::sync_queue::{AdmissionError, JobQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 一轮调度的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReport {
    pub enqueued: usize,
    pub rejected: usize,
}

/// 同步调度器
///
/// 定期为所有已绑定的句柄投递 `RefreshSubmissions` 任务
pub struct SyncScheduler<Q, R>
where
    Q: JobQueue + 'static,
    R: ProfileRepository + 'static,
{
    queue: Arc<Q>,
    repository: Arc<R>,
    interval: Duration,
}

impl<Q, R> SyncScheduler<Q, R>
where
    Q: JobQueue + 'static,
    R: ProfileRepository + 'static,
{
    pub fn new(queue: Arc<Q>, repository: Arc<R>, interval: Duration) -> Self {
        Self {
            queue,
            repository,
            interval,
        }
    }

    /// 执行一轮调度
    ///
    /// 准入拒绝只记录日志，不中断本轮
    pub async fn tick(&self) -> ScheduleReport {
        let handles = match self.repository.list_handles().await {
            Ok(handles) => handles,
            Err(e) => {
                error!("Failed to list attached handles: {}", e);
                return ScheduleReport::default();
            }
        };

        let mut report = ScheduleReport::default();
        for (user_id, handle) in handles {
            let job = SyncJob::new(user_id, &handle.site, JobAction::RefreshSubmissions);
            match self.queue.enqueue(job) {
                Ok(_) => report.enqueued += 1,
                Err(AdmissionError::DuplicateJob { .. }) => report.rejected += 1,
                Err(e) => {
                    warn!(%user_id, site = %handle.site, "Scheduled refresh rejected: {}", e);
                    report.rejected += 1;
                }
            }
        }
        report
    }

    /// 启动调度器后台任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄，取消 `shutdown` 后任务退出
    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 第一次 tick 立即返回，跳过以免与启动时的同步重叠
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = self.tick().await;
                        info!(
                            enqueued = report.enqueued,
                            rejected = report.rejected,
                            "Scheduler refresh tick"
                        );
                    }
                }
            }
        })
    }
}
