// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{Handle, ProfileInfo, RatingPoint, Submission, SyncCutoff};
use crate::domain::repositories::profile_repository::{ProfileRepository, RepositoryError};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

type RecordKey = (Uuid, String);

/// 单个 (用户, 站点) 的存储记录
#[derive(Debug, Clone, Default)]
struct SiteRecord {
    handle: Option<String>,
    profile: Option<ProfileInfo>,
    submissions: Vec<Submission>,
    rating_history: Vec<RatingPoint>,
    cutoff: SyncCutoff,
}

/// 基于 DashMap 的内存资料仓库
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    records: DashMap<RecordKey, SiteRecord>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: Uuid, site: &str) -> RecordKey {
        (user_id, site.to_lowercase())
    }

    pub fn profile(&self, user_id: Uuid, site: &str) -> Option<ProfileInfo> {
        self.records
            .get(&Self::key(user_id, site))
            .and_then(|r| r.profile.clone())
    }

    /// 已存储的提交，最新的在前
    pub fn submissions(&self, user_id: Uuid, site: &str) -> Vec<Submission> {
        self.records
            .get(&Self::key(user_id, site))
            .map(|r| r.submissions.clone())
            .unwrap_or_default()
    }

    pub fn rating_history(&self, user_id: Uuid, site: &str) -> Vec<RatingPoint> {
        self.records
            .get(&Self::key(user_id, site))
            .map(|r| r.rating_history.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        site: &str,
        profile: ProfileInfo,
    ) -> Result<(), RepositoryError> {
        self.records
            .entry(Self::key(user_id, site))
            .or_default()
            .profile = Some(profile);
        Ok(())
    }

    async fn append_submissions(
        &self,
        user_id: Uuid,
        site: &str,
        mut submissions: Vec<Submission>,
    ) -> Result<(), RepositoryError> {
        if submissions.is_empty() {
            return Ok(());
        }
        let newest = submissions.iter().map(|s| s.created_at).max();

        let mut record = self.records.entry(Self::key(user_id, site)).or_default();
        submissions.append(&mut record.submissions);
        record.submissions = submissions;
        record.cutoff = record.cutoff.max(newest);
        Ok(())
    }

    async fn replace_rating_history(
        &self,
        user_id: Uuid,
        site: &str,
        history: Vec<RatingPoint>,
    ) -> Result<(), RepositoryError> {
        self.records
            .entry(Self::key(user_id, site))
            .or_default()
            .rating_history = history;
        Ok(())
    }

    async fn get_last_sync_cutoff(
        &self,
        user_id: Uuid,
        site: &str,
    ) -> Result<SyncCutoff, RepositoryError> {
        Ok(self
            .records
            .get(&Self::key(user_id, site))
            .and_then(|r| r.cutoff))
    }

    async fn get_handle(
        &self,
        user_id: Uuid,
        site: &str,
    ) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .records
            .get(&Self::key(user_id, site))
            .and_then(|r| r.handle.clone()))
    }

    async fn attach_handle(&self, user_id: Uuid, handle: Handle) -> Result<(), RepositoryError> {
        let mut record = self.records.entry(Self::key(user_id, &handle.site)).or_default();
        match &record.handle {
            Some(existing) if *existing == handle.username => Ok(()),
            Some(existing) => Err(RepositoryError::AlreadyExists(format!(
                "{} handle '{}' already attached",
                handle.site, existing
            ))),
            None => {
                record.handle = Some(handle.username);
                Ok(())
            }
        }
    }

    async fn list_handles(&self) -> Result<Vec<(Uuid, Handle)>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter_map(|entry| {
                let (user_id, site) = entry.key();
                entry
                    .value()
                    .handle
                    .as_ref()
                    .map(|username| (*user_id, Handle::new(site.clone(), username.clone())))
            })
            .collect())
    }
}
