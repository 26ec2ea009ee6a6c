// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{eventually, FAKE_SITE};
use profile_sync::domain::models::profile::Handle;
use profile_sync::domain::models::sync_job::JobAction;
use profile_sync::domain::repositories::profile_repository::ProfileRepository;
use profile_sync::infrastructure::repositories::memory_profile_repo::InMemoryProfileRepository;
use profile_sync::queue::scheduler::{ScheduleReport, SyncScheduler};
use profile_sync::queue::sync_queue::{BoundedSyncQueue, JobQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

async fn repo_with_handles(count: usize) -> Arc<InMemoryProfileRepository> {
    let repo = Arc::new(InMemoryProfileRepository::new());
    for i in 0..count {
        repo.attach_handle(Uuid::new_v4(), Handle::new(FAKE_SITE, format!("user{}", i)))
            .await
            .unwrap();
    }
    repo
}

#[tokio::test]
async fn test_tick_enqueues_refresh_per_handle_and_skips_in_flight() {
    let repo = repo_with_handles(3).await;
    let queue = Arc::new(BoundedSyncQueue::new(16, 64));
    let scheduler = SyncScheduler::new(queue.clone(), repo, Duration::from_secs(60));

    assert_eq!(
        scheduler.tick().await,
        ScheduleReport {
            enqueued: 3,
            rejected: 0
        }
    );
    assert_eq!(
        scheduler.tick().await,
        ScheduleReport {
            enqueued: 0,
            rejected: 3
        }
    );

    let job = queue.dequeue().await.unwrap();
    assert_eq!(job.action, JobAction::RefreshSubmissions);
}

#[tokio::test]
async fn test_tick_counts_queue_full_rejections() {
    let repo = repo_with_handles(3).await;
    let queue = Arc::new(BoundedSyncQueue::new(1, 64));
    let scheduler = SyncScheduler::new(queue.clone(), repo, Duration::from_secs(60));

    let report = scheduler.tick().await;
    assert_eq!(report.enqueued, 1);
    assert_eq!(report.rejected, 2);
}

#[tokio::test]
async fn test_started_scheduler_ticks_and_stops_on_shutdown() {
    let repo = repo_with_handles(2).await;
    let queue = Arc::new(BoundedSyncQueue::new(16, 64));
    let shutdown = CancellationToken::new();

    let handle = SyncScheduler::new(queue.clone(), repo, Duration::from_millis(20))
        .start(shutdown.clone());

    let observed = queue.clone();
    assert!(eventually(|| observed.in_flight() == 2).await);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler must stop after shutdown")
        .unwrap();
}
