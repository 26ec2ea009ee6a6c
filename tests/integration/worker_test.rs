// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    eventually, registry_with, submission, t0, FakeSite, RecordingNotifier, FAKE_SITE,
};
use chrono::Duration as ChronoDuration;
use profile_sync::domain::models::profile::Handle;
use profile_sync::domain::models::sync_job::{JobAction, JobStatus, SyncJob};
use profile_sync::domain::repositories::profile_repository::ProfileRepository;
use profile_sync::domain::services::sync_engine::SyncEngine;
use profile_sync::domain::site::SiteError;
use profile_sync::infrastructure::repositories::memory_profile_repo::InMemoryProfileRepository;
use profile_sync::queue::sync_queue::{BoundedSyncQueue, JobQueue};
use profile_sync::workers::background::BackgroundPool;
use profile_sync::workers::manager::WorkerManager;
use profile_sync::workers::sync_worker::SyncWorker;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Fixture {
    site: Arc<FakeSite>,
    queue: Arc<BoundedSyncQueue>,
    repo: Arc<InMemoryProfileRepository>,
    notifier: Arc<RecordingNotifier>,
    engine: Arc<SyncEngine>,
    user: Uuid,
}

async fn fixture() -> Fixture {
    let site = FakeSite::new();
    let repo = Arc::new(InMemoryProfileRepository::new());
    let user = Uuid::new_v4();
    repo.attach_handle(user, Handle::new(FAKE_SITE, "alice"))
        .await
        .unwrap();
    Fixture {
        engine: Arc::new(SyncEngine::new(registry_with(site.clone()))),
        site,
        queue: Arc::new(BoundedSyncQueue::new(8, 64)),
        repo,
        notifier: Arc::new(RecordingNotifier::default()),
        user,
    }
}

impl Fixture {
    fn worker(&self, job_timeout: Duration) -> SyncWorker<BoundedSyncQueue, InMemoryProfileRepository> {
        SyncWorker::new(
            self.queue.clone(),
            self.repo.clone(),
            self.engine.clone(),
            self.notifier.clone(),
            BackgroundPool::new(4),
            job_timeout,
        )
    }

    async fn next_job(&self, action: JobAction) -> SyncJob {
        self.queue
            .enqueue(SyncJob::new(self.user, FAKE_SITE, action))
            .unwrap();
        self.queue.dequeue().await.unwrap()
    }
}

#[tokio::test]
async fn test_completed_job_persists_delta_and_notifies() {
    let f = fixture().await;
    f.site
        .set_submissions(vec![submission(2, "second"), submission(1, "first")]);
    let worker = f.worker(Duration::from_secs(5));

    let job = f.next_job(JobAction::AddOrUpdateProfile).await;
    let status = worker.process_job(job.clone(), CancellationToken::new()).await;

    assert_eq!(status, JobStatus::Completed);
    assert_eq!(f.queue.status(job.id), Some(JobStatus::Completed));
    assert_eq!(f.queue.in_flight(), 0);
    assert_eq!(f.repo.submissions(f.user, FAKE_SITE).len(), 2);
    assert_eq!(
        f.repo.get_last_sync_cutoff(f.user, FAKE_SITE).await.unwrap(),
        Some(t0() + ChronoDuration::seconds(2))
    );
    assert_eq!(
        f.repo.profile(f.user, FAKE_SITE).map(|p| p.username),
        Some("alice".to_string())
    );

    let notifier = f.notifier.clone();
    assert!(eventually(|| notifier.received.lock().len() == 1).await);
    assert_eq!(f.notifier.received.lock()[0].new_submissions, 2);
}

#[tokio::test]
async fn test_second_sync_only_appends_newer_submissions() {
    let f = fixture().await;
    let worker = f.worker(Duration::from_secs(5));

    f.site.set_submissions(vec![submission(1, "first")]);
    let job = f.next_job(JobAction::AddOrUpdateProfile).await;
    worker.process_job(job, CancellationToken::new()).await;

    f.site
        .set_submissions(vec![submission(5, "third"), submission(3, "second"), submission(1, "first")]);
    let job = f.next_job(JobAction::RefreshSubmissions).await;
    assert_eq!(
        worker.process_job(job, CancellationToken::new()).await,
        JobStatus::Completed
    );

    let stored: Vec<_> = f
        .repo
        .submissions(f.user, FAKE_SITE)
        .into_iter()
        .map(|s| s.problem)
        .collect();
    assert_eq!(stored, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_failed_job_releases_slot_and_keeps_cutoff() {
    let f = fixture().await;
    f.site
        .set_failure(Some(SiteError::transport(FAKE_SITE, "connection refused")));
    let worker = f.worker(Duration::from_secs(5));

    let job = f.next_job(JobAction::AddOrUpdateProfile).await;
    assert_eq!(
        worker.process_job(job.clone(), CancellationToken::new()).await,
        JobStatus::Failed
    );
    assert_eq!(f.queue.status(job.id), Some(JobStatus::Failed));
    assert_eq!(f.queue.in_flight(), 0);
    assert_eq!(f.repo.get_last_sync_cutoff(f.user, FAKE_SITE).await.unwrap(), None);
    assert!(f.repo.profile(f.user, FAKE_SITE).is_none());

    // 可以重新入队
    assert!(f
        .queue
        .enqueue(SyncJob::new(f.user, FAKE_SITE, JobAction::AddOrUpdateProfile))
        .is_ok());
}

#[tokio::test]
async fn test_redelivered_running_job_is_not_executed_twice() {
    let f = fixture().await;
    f.site.set_submissions(vec![submission(1, "A")]);
    let worker = f.worker(Duration::from_secs(5));

    let mut job = f.next_job(JobAction::RefreshSubmissions).await;
    f.queue.mark_running(&mut job).unwrap();

    assert_eq!(
        worker.process_job(job.clone(), CancellationToken::new()).await,
        JobStatus::Running
    );
    assert_eq!(f.site.profile_calls.load(Ordering::SeqCst), 0);
    assert_eq!(f.queue.in_flight(), 0);
    assert!(f.repo.submissions(f.user, FAKE_SITE).is_empty());
}

#[tokio::test]
async fn test_job_without_handle_fails() {
    let f = fixture().await;
    let worker = f.worker(Duration::from_secs(5));
    let stranger = Uuid::new_v4();

    f.queue
        .enqueue(SyncJob::new(stranger, FAKE_SITE, JobAction::AddOrUpdateProfile))
        .unwrap();
    let job = f.queue.dequeue().await.unwrap();
    assert_eq!(
        worker.process_job(job, CancellationToken::new()).await,
        JobStatus::Failed
    );
}

#[tokio::test]
async fn test_slow_site_times_out_and_frees_slot() {
    let f = fixture().await;
    f.site.set_delay(Duration::from_secs(30));
    let worker = f.worker(Duration::from_millis(50));

    let job = f.next_job(JobAction::AddOrUpdateProfile).await;
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        worker.process_job(job, CancellationToken::new()),
    )
    .await
    .expect("job timeout must bound processing");

    assert_eq!(status, JobStatus::Failed);
    assert_eq!(f.queue.in_flight(), 0);
}

#[tokio::test]
async fn test_cancelled_context_fails_job() {
    let f = fixture().await;
    f.site.set_delay(Duration::from_secs(30));
    let worker = f.worker(Duration::from_secs(60));

    let job = f.next_job(JobAction::AddOrUpdateProfile).await;
    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    assert_eq!(worker.process_job(job, ctx).await, JobStatus::Failed);
}

#[tokio::test]
async fn test_manager_processes_queue_and_shuts_down() {
    let f = fixture().await;
    f.site.set_submissions(vec![submission(1, "first")]);

    let mut manager = WorkerManager::new(
        f.queue.clone(),
        f.repo.clone(),
        f.engine.clone(),
        f.notifier.clone(),
        BackgroundPool::new(4),
        Duration::from_secs(5),
    );
    manager.start_workers(2);
    assert_eq!(manager.worker_count(), 2);

    let job = f
        .queue
        .enqueue(SyncJob::new(f.user, FAKE_SITE, JobAction::AddOrUpdateProfile))
        .unwrap();

    let queue = f.queue.clone();
    assert!(eventually(|| queue.status(job.id) == Some(JobStatus::Completed)).await);

    tokio::time::timeout(Duration::from_secs(5), manager.shutdown())
        .await
        .expect("workers must stop after shutdown");
    assert_eq!(manager.worker_count(), 0);
    assert!(f
        .queue
        .enqueue(SyncJob::new(Uuid::new_v4(), FAKE_SITE, JobAction::AddOrUpdateProfile))
        .is_err());
}
