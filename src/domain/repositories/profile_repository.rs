// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{Handle, ProfileInfo, RatingPoint, Submission, SyncCutoff};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// 存储后端错误
    #[error("Storage error: {0}")]
    Storage(String),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 记录已存在且不可修改
    #[error("Record already exists: {0}")]
    AlreadyExists(String),
}

/// 资料仓库特质
///
/// 同步引擎的持久化协作方。只有消费已完成任务结果的工作器会写入，
/// 同一 (用户, 站点) 不会出现并发写入。
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// 写入或覆盖某站点的资料
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        site: &str,
        profile: ProfileInfo,
    ) -> Result<(), RepositoryError>;

    /// 追加新提交（最新的在前），并将截止时间推进到最新一条
    async fn append_submissions(
        &self,
        user_id: Uuid,
        site: &str,
        submissions: Vec<Submission>,
    ) -> Result<(), RepositoryError>;

    /// 替换积分曲线
    async fn replace_rating_history(
        &self,
        user_id: Uuid,
        site: &str,
        history: Vec<RatingPoint>,
    ) -> Result<(), RepositoryError>;

    /// 获取上次同步的截止时间
    async fn get_last_sync_cutoff(
        &self,
        user_id: Uuid,
        site: &str,
    ) -> Result<SyncCutoff, RepositoryError>;

    /// 获取用户在某站点绑定的用户名
    async fn get_handle(&self, user_id: Uuid, site: &str)
        -> Result<Option<String>, RepositoryError>;

    /// 绑定句柄，已绑定的句柄不可修改
    async fn attach_handle(&self, user_id: Uuid, handle: Handle) -> Result<(), RepositoryError>;

    /// 列出所有已绑定的句柄
    async fn list_handles(&self) -> Result<Vec<(Uuid, Handle)>, RepositoryError>;
}

#[async_trait]
impl<T: ProfileRepository + ?Sized> ProfileRepository for std::sync::Arc<T> {
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        site: &str,
        profile: ProfileInfo,
    ) -> Result<(), RepositoryError> {
        (**self).upsert_profile(user_id, site, profile).await
    }

    async fn append_submissions(
        &self,
        user_id: Uuid,
        site: &str,
        submissions: Vec<Submission>,
    ) -> Result<(), RepositoryError> {
        (**self).append_submissions(user_id, site, submissions).await
    }

    async fn replace_rating_history(
        &self,
        user_id: Uuid,
        site: &str,
        history: Vec<RatingPoint>,
    ) -> Result<(), RepositoryError> {
        (**self).replace_rating_history(user_id, site, history).await
    }

    async fn get_last_sync_cutoff(
        &self,
        user_id: Uuid,
        site: &str,
    ) -> Result<SyncCutoff, RepositoryError> {
        (**self).get_last_sync_cutoff(user_id, site).await
    }

    async fn get_handle(
        &self,
        user_id: Uuid,
        site: &str,
    ) -> Result<Option<String>, RepositoryError> {
        (**self).get_handle(user_id, site).await
    }

    async fn attach_handle(&self, user_id: Uuid, handle: Handle) -> Result<(), RepositoryError> {
        (**self).attach_handle(user_id, handle).await
    }

    async fn list_handles(&self) -> Result<Vec<(Uuid, Handle)>, RepositoryError> {
        (**self).list_handles().await
    }
}
