// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// 有界后台任务池
///
/// 调用方提交后立即返回，不等待任务完成；池满时直接丢弃
#[derive(Debug, Clone)]
pub struct BackgroundPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl BackgroundPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前空闲的许可数
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// 提交后台任务
    ///
    /// # 返回值
    ///
    /// * `true` - 已接收并开始执行
    /// * `false` - 池已满，任务被丢弃
    pub fn submit<F>(&self, name: &'static str, task: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(task = name, capacity = self.capacity, "Background pool saturated, dropping task");
                return false;
            }
        };

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = task.await {
                error!(task = name, "Background task failed: {:#}", e);
            }
        });
        true
    }
}
