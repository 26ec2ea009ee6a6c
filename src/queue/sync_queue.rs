// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::sync_job::{DomainError, JobStatus, SyncJob};
use crate::infrastructure::metrics::{JOBS_ENQUEUED, JOBS_REJECTED};
use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// 准入错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// 队列已满
    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// 同一 (用户, 站点) 已有未结束的任务
    #[error("A sync job for user {user_id} on {site} is already in flight")]
    DuplicateJob { user_id: Uuid, site: String },

    /// 队列已关闭
    #[error("Queue is closed")]
    Closed,
}

impl AdmissionError {
    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::QueueFull { .. } => "queue_full",
            AdmissionError::DuplicateJob { .. } => "duplicate",
            AdmissionError::Closed => "closed",
        }
    }
}

/// 准入结果
///
/// 供请求层映射为响应，拒绝时 `reason` 说明原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub accepted: bool,
    pub job_id: Option<Uuid>,
    pub reason: Option<String>,
}

impl Admission {
    pub fn accepted(job: &SyncJob) -> Self {
        Self {
            accepted: true,
            job_id: Some(job.id),
            reason: None,
        }
    }

    pub fn rejected(error: &AdmissionError) -> Self {
        Self {
            accepted: false,
            job_id: None,
            reason: Some(error.to_string()),
        }
    }
}

impl From<Result<SyncJob, AdmissionError>> for Admission {
    fn from(result: Result<SyncJob, AdmissionError>) -> Self {
        match result {
            Ok(job) => Admission::accepted(&job),
            Err(e) => Admission::rejected(&e),
        }
    }
}

/// 同步任务队列特质
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队任务，从不阻塞
    fn enqueue(&self, job: SyncJob) -> Result<SyncJob, AdmissionError>;

    /// 出队任务，队列关闭且取空后返回 `None`
    async fn dequeue(&self) -> Option<SyncJob>;

    /// 标记任务开始执行
    fn mark_running(&self, job: &mut SyncJob) -> Result<(), DomainError>;

    /// 完成任务并释放 (用户, 站点) 占用
    fn complete(&self, job: &mut SyncJob) -> Result<(), DomainError>;

    /// 失败任务并释放 (用户, 站点) 占用
    fn fail(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError>;

    /// 放弃无法开始执行的任务并释放占用，可拒绝时记为 `Rejected`
    fn discard(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError>;

    /// 最后一次观察到的任务状态
    fn status(&self, job_id: Uuid) -> Option<JobStatus>;

    /// 当前未结束的任务数量
    fn in_flight(&self) -> usize;

    /// 停止接收新任务
    fn close(&self);
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for std::sync::Arc<T> {
    fn enqueue(&self, job: SyncJob) -> Result<SyncJob, AdmissionError> {
        (**self).enqueue(job)
    }

    async fn dequeue(&self) -> Option<SyncJob> {
        (**self).dequeue().await
    }

    fn mark_running(&self, job: &mut SyncJob) -> Result<(), DomainError> {
        (**self).mark_running(job)
    }

    fn complete(&self, job: &mut SyncJob) -> Result<(), DomainError> {
        (**self).complete(job)
    }

    fn fail(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError> {
        (**self).fail(job, reason)
    }

    fn discard(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError> {
        (**self).discard(job, reason)
    }

    fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        (**self).status(job_id)
    }

    fn in_flight(&self) -> usize {
        (**self).in_flight()
    }

    fn close(&self) {
        (**self).close()
    }
}

/// 准入状态，发送端和占用集合在同一把锁下修改
struct AdmissionState {
    sender: Option<mpsc::Sender<SyncJob>>,
    in_flight: HashSet<(Uuid, String)>,
}

/// 有界同步任务队列
///
/// 基于有界 mpsc 通道，满时立即拒绝而不是等待
pub struct BoundedSyncQueue {
    capacity: usize,
    status_retention: usize,
    state: Mutex<AdmissionState>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<SyncJob>>,
    statuses: DashMap<Uuid, JobStatus>,
    terminal_order: Mutex<VecDeque<Uuid>>,
}

impl BoundedSyncQueue {
    /// 创建新的有界队列
    ///
    /// # 参数
    ///
    /// * `capacity` - 通道容量，最小为 1
    /// * `status_retention` - 保留的终态任务状态数量
    pub fn new(capacity: usize, status_retention: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            capacity,
            status_retention: status_retention.max(1),
            state: Mutex::new(AdmissionState {
                sender: Some(sender),
                in_flight: HashSet::new(),
            }),
            receiver: tokio::sync::Mutex::new(receiver),
            statuses: DashMap::new(),
            terminal_order: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn admit(&self, job: &SyncJob) -> Result<(), AdmissionError> {
        let mut state = self.state.lock();
        let key = job.key();

        let sender = state.sender.as_ref().ok_or(AdmissionError::Closed)?;
        if state.in_flight.contains(&key) {
            return Err(AdmissionError::DuplicateJob {
                user_id: job.user_id,
                site: job.site.clone(),
            });
        }
        match sender.try_send(job.clone()) {
            Ok(()) => {
                state.in_flight.insert(key);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(AdmissionError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(_)) => Err(AdmissionError::Closed),
        }
    }

    fn release(&self, job: &SyncJob) {
        self.state.lock().in_flight.remove(&job.key());
    }

    fn record_terminal(&self, job: &SyncJob) {
        self.statuses.insert(job.id, job.status);
        let mut order = self.terminal_order.lock();
        order.push_back(job.id);
        while order.len() > self.status_retention {
            if let Some(expired) = order.pop_front() {
                self.statuses.remove(&expired);
            }
        }
    }
}

#[async_trait]
impl JobQueue for BoundedSyncQueue {
    fn enqueue(&self, mut job: SyncJob) -> Result<SyncJob, AdmissionError> {
        match self.admit(&job) {
            Ok(()) => {
                self.statuses.insert(job.id, job.status);
                counter!(JOBS_ENQUEUED).increment(1);
                debug!(job_id = %job.id, user_id = %job.user_id, site = %job.site, "Sync job enqueued");
                Ok(job)
            }
            Err(e) => {
                counter!(JOBS_REJECTED, "reason" => e.reason()).increment(1);
                warn!(job_id = %job.id, user_id = %job.user_id, site = %job.site, "Sync job rejected: {}", e);
                if job.reject(e.to_string()).is_ok() {
                    self.record_terminal(&job);
                }
                Err(e)
            }
        }
    }

    async fn dequeue(&self) -> Option<SyncJob> {
        self.receiver.lock().await.recv().await
    }

    fn mark_running(&self, job: &mut SyncJob) -> Result<(), DomainError> {
        job.start()?;
        self.statuses.insert(job.id, job.status);
        Ok(())
    }

    fn complete(&self, job: &mut SyncJob) -> Result<(), DomainError> {
        self.release(job);
        job.complete()?;
        self.record_terminal(job);
        Ok(())
    }

    fn fail(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError> {
        self.release(job);
        job.fail(reason)?;
        self.record_terminal(job);
        Ok(())
    }

    fn discard(&self, job: &mut SyncJob, reason: &str) -> Result<(), DomainError> {
        self.release(job);
        let result = job.reject(reason);
        if job.status.is_terminal() {
            self.record_terminal(job);
        }
        result
    }

    fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.statuses.get(&job_id).map(|s| *s)
    }

    fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    fn close(&self) {
        // 丢弃发送端后，接收端取完剩余任务即返回 None
        self.state.lock().sender.take();
    }
}
