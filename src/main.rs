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

use anyhow::Context;
use profile_sync::config::settings::Settings;
use profile_sync::domain::models::profile::Handle;
use profile_sync::domain::models::sync_job::{JobAction, SyncJob};
use profile_sync::domain::repositories::profile_repository::ProfileRepository;
use profile_sync::domain::services::sync_engine::SyncEngine;
use profile_sync::infrastructure::metrics;
use profile_sync::infrastructure::repositories::memory_profile_repo::InMemoryProfileRepository;
use profile_sync::infrastructure::services::logging_notifier::LoggingNotifier;
use profile_sync::infrastructure::sites::{AdapterRegistry, SiteClient};
use profile_sync::queue::scheduler::SyncScheduler;
use profile_sync::queue::sync_queue::{BoundedSyncQueue, JobQueue};
use profile_sync::utils::telemetry;
use profile_sync::workers::background::BackgroundPool;
use profile_sync::workers::manager::WorkerManager;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // Initialize telemetry
    telemetry::init_telemetry(&settings.telemetry);
    metrics::init_metrics(&settings.metrics);

    info!("Starting profile-sync...");

    // Adapter registry
    let client = Arc::new(SiteClient::new(
        settings.sites.request_timeout(),
        &settings.sites.user_agent,
    ));
    let client_timeout = client.timeout();
    let registry = Arc::new(
        AdapterRegistry::from_settings(&settings.sites, client)
            .context("Failed to build adapter registry")?,
    );

    // Persistence and queue
    let repository = Arc::new(InMemoryProfileRepository::new());
    let queue = Arc::new(BoundedSyncQueue::new(
        settings.queue.capacity,
        settings.queue.status_retention,
    ));

    for seed in &settings.seed_handles {
        if !registry.is_supported(&seed.site) {
            warn!(site = %seed.site, "Skipping seed handle for unsupported site");
            continue;
        }
        repository
            .attach_handle(seed.user_id, Handle::new(seed.site.clone(), seed.handle.clone()))
            .await
            .context("Failed to attach seed handle")?;
        if let Err(e) = queue.enqueue(SyncJob::new(seed.user_id, &seed.site, JobAction::AddOrUpdateProfile)) {
            warn!(site = %seed.site, handle = %seed.handle, "Initial sync not queued: {}", e);
        }
    }

    // Workers
    let engine = Arc::new(SyncEngine::new(registry.clone()));
    let background = BackgroundPool::new(settings.sync.background_permits);
    info!(
        queue_capacity = queue.capacity(),
        background_permits = background.capacity(),
        request_timeout = ?client_timeout,
        "Sync pipeline configured"
    );
    let mut manager = WorkerManager::new(
        queue.clone(),
        repository.clone(),
        engine,
        Arc::new(LoggingNotifier::new()),
        background,
        settings.sync.job_timeout(),
    );
    manager.start_workers(settings.sync.worker_count);

    // Scheduler
    let scheduler_handle = settings.sync.schedule_interval().map(|interval| {
        info!("Periodic refresh every {:?}", interval);
        SyncScheduler::new(queue.clone(), repository.clone(), interval)
            .start(manager.shutdown_token())
    });

    manager.wait_for_shutdown().await;
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    info!("profile-sync stopped");
    Ok(())
}
