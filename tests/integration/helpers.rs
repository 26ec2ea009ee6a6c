// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use profile_sync::domain::models::profile::{
    Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff,
};
use profile_sync::domain::services::notifier::{SyncNotification, SyncNotifier};
use profile_sync::domain::site::cutoff::cutoff_index;
use profile_sync::domain::site::{SiteAdapter, SiteError};
use profile_sync::infrastructure::sites::AdapterRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const FAKE_SITE: &str = "fake";

/// `check_handle` 对这个句柄返回 `Ok(false)`
pub const GHOST_HANDLE: &str = "ghost";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn submission(offset_secs: i64, problem: &str) -> Submission {
    Submission {
        contest: "fake-contest".to_string(),
        problem: problem.to_string(),
        url: format!("https://fake.example/{}", problem),
        status: "Accepted".to_string(),
        created_at: t0() + ChronoDuration::seconds(offset_secs),
        site: FAKE_SITE.to_string(),
    }
}

/// 可编程的模拟站点
///
/// 所有由注册表构造的适配器共享同一份状态
#[derive(Default)]
pub struct FakeSite {
    pub profile: Mutex<ProfileInfo>,
    /// 最新的在前
    pub submissions: Mutex<Vec<Submission>>,
    pub rating: Mutex<Vec<RatingPoint>>,
    pub fail_with: Mutex<Option<SiteError>>,
    pub delay: Mutex<Option<Duration>>,
    pub profile_calls: AtomicUsize,
    pub rating_calls: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        let site = Self::default();
        *site.profile.lock() = ProfileInfo {
            name: "Fake User".to_string(),
            username: "alice".to_string(),
            school: "Fake University".to_string(),
        };
        Arc::new(site)
    }

    pub fn set_submissions(&self, submissions: Vec<Submission>) {
        *self.submissions.lock() = submissions;
    }

    pub fn set_failure(&self, error: Option<SiteError>) {
        *self.fail_with.lock() = error;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    fn failure(&self) -> Result<(), SiteError> {
        match self.fail_with.lock().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub struct FakeAdapter {
    site: Arc<FakeSite>,
    handle: String,
    ctx: CancellationToken,
}

impl FakeAdapter {
    async fn pause(&self) -> Result<(), SiteError> {
        let delay = *self.site.delay.lock();
        if let Some(delay) = delay {
            tokio::select! {
                _ = self.ctx.cancelled() => return Err(SiteError::transport(FAKE_SITE, "request cancelled")),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.site.failure()
    }
}

#[async_trait]
impl SiteAdapter for FakeAdapter {
    fn site(&self) -> &'static str {
        FAKE_SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        self.pause().await?;
        Ok(self.handle != GHOST_HANDLE)
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        self.site.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        Ok(self.site.profile.lock().clone())
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        self.pause().await?;
        let mut submissions = self.site.submissions.lock().clone();
        let index = cutoff_index(&submissions, after);
        submissions.truncate(index);
        Ok(submissions)
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        self.pause().await?;
        Ok(Vec::new())
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        self.site.rating_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        Ok(self.site.rating.lock().clone())
    }
}

/// 只注册模拟站点的注册表
pub fn registry_with(site: Arc<FakeSite>) -> Arc<AdapterRegistry> {
    let registry = AdapterRegistry::builder()
        .register(FAKE_SITE, move |handle, ctx| {
            Arc::new(FakeAdapter {
                site: site.clone(),
                handle,
                ctx,
            })
        })
        .build();
    Arc::new(registry)
}

/// 收集所有通知的通知器
#[derive(Default)]
pub struct RecordingNotifier {
    pub received: Mutex<Vec<SyncNotification>>,
}

#[async_trait]
impl SyncNotifier for RecordingNotifier {
    async fn notify(&self, notification: &SyncNotification) -> anyhow::Result<()> {
        self.received.lock().push(notification.clone());
        Ok(())
    }
}

/// 等待条件成立，最多约一秒
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
