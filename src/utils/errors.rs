// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::profile_repository::RepositoryError;
use crate::domain::services::sync_engine::SyncError;
use std::time::Duration;
use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("同步错误: {0}")]
    Sync(#[from] SyncError),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("未绑定句柄: {site}")]
    NoHandle { site: String },

    #[error("任务超时: {0:?}")]
    Timeout(Duration),
}

impl WorkerError {
    /// 客户端重新提交是否可能成功
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Sync(e) => e.is_retryable(),
            WorkerError::Repository(_) | WorkerError::Timeout(_) => true,
            WorkerError::NoHandle { .. } => false,
        }
    }
}
