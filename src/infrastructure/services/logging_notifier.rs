// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::notifier::{SyncNotification, SyncNotifier};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// 只写日志的通知实现
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SyncNotifier for LoggingNotifier {
    async fn notify(&self, notification: &SyncNotification) -> Result<()> {
        info!(
            user_id = %notification.user_id,
            site = %notification.site,
            handle = %notification.handle,
            new_submissions = notification.new_submissions,
            rating_points = ?notification.rating_points,
            "Profile sync finished"
        );
        Ok(())
    }
}
