// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{ProfileInfo, RatingPoint, Submission, SyncCutoff};
use crate::domain::models::sync_job::JobAction;
use crate::domain::site::SiteError;
use crate::infrastructure::sites::registry::{AdapterRegistry, RegistryError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// 同步错误
///
/// 原样转发注册表和适配器的错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Site(#[from] SiteError),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Site(e) => e.is_retryable(),
            SyncError::Registry(_) => false,
        }
    }
}

/// 一次同步得到的增量
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    pub user_id: Uuid,
    pub site: String,
    pub handle: String,
    pub profile: ProfileInfo,
    /// 严格晚于 `previous_cutoff` 的提交，最新的在前
    pub submissions: Vec<Submission>,
    /// 仅 `AddOrUpdateProfile` 会刷新积分曲线
    pub rating_history: Option<Vec<RatingPoint>>,
    pub previous_cutoff: SyncCutoff,
    /// 最新提交时间；没有新提交时等于 `previous_cutoff`
    pub new_cutoff: SyncCutoff,
}

/// 增量同步引擎
///
/// 只负责拉取和计算增量，不做持久化，也不协调多个站点
#[derive(Debug, Clone)]
pub struct SyncEngine {
    registry: Arc<AdapterRegistry>,
}

impl SyncEngine {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// 拉取 (用户, 站点) 自 `last_cutoff` 以来的数据
    pub async fn sync(
        &self,
        user_id: Uuid,
        site: &str,
        handle: &str,
        last_cutoff: SyncCutoff,
        action: JobAction,
        ctx: CancellationToken,
    ) -> Result<SyncResult, SyncError> {
        let adapter = self.registry.resolve(site, handle, ctx)?;

        let (profile, submissions) = tokio::try_join!(
            adapter.fetch_profile(),
            adapter.fetch_submissions(last_cutoff)
        )?;

        let rating_history = if action.includes_rating_history() {
            Some(adapter.fetch_rating_history().await?)
        } else {
            None
        };

        let newest = submissions.iter().map(|s| s.created_at).max();
        let new_cutoff = newest.max(last_cutoff);
        debug!(
            %user_id,
            site = adapter.site(),
            new_submissions = submissions.len(),
            ?new_cutoff,
            "Sync fetched delta"
        );

        Ok(SyncResult {
            user_id,
            site: adapter.site().to_string(),
            handle: handle.to_string(),
            profile,
            submissions,
            rating_history,
            previous_cutoff: last_cutoff,
            new_cutoff,
        })
    }
}
