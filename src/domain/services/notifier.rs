// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// 同步完成通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncNotification {
    pub user_id: Uuid,
    pub site: String,
    pub handle: String,
    /// 本次新增的提交数量
    pub new_submissions: usize,
    /// 积分曲线点数，未刷新积分时为 `None`
    pub rating_points: Option<usize>,
}

/// 同步通知特质
///
/// 在后台任务池中调用，失败只记录日志
#[async_trait]
pub trait SyncNotifier: Send + Sync {
    /// 发送同步完成通知
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 发送成功
    /// * `Err(anyhow::Error)` - 发送失败
    async fn notify(&self, notification: &SyncNotification) -> Result<()>;
}
