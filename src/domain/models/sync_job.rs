// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 同步任务实体
///
/// 表示一次针对 (用户, 站点) 的抓取请求。任务在排队和执行期间
/// 由调度器独占，进入终态后只保留状态记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 用户ID
    pub user_id: Uuid,
    /// 站点标识
    pub site: String,
    /// 请求的动作
    pub action: JobAction,
    /// 入队时间
    pub enqueued_at: DateTime<Utc>,
    /// 当前状态
    pub status: JobStatus,
    /// 开始执行时间
    pub started_at: Option<DateTime<Utc>>,
    /// 进入终态的时间
    pub finished_at: Option<DateTime<Utc>>,
    /// 失败原因（仅内部诊断使用）
    pub failure_reason: Option<String>,
}

/// 任务动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    /// 更新资料、增量提交以及积分曲线
    #[default]
    AddOrUpdateProfile,
    /// 仅更新资料与增量提交
    RefreshSubmissions,
}

impl JobAction {
    /// 是否需要拉取积分曲线
    pub fn includes_rating_history(&self) -> bool {
        matches!(self, JobAction::AddOrUpdateProfile)
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobAction::AddOrUpdateProfile => write!(f, "add_or_update_profile"),
            JobAction::RefreshSubmissions => write!(f, "refresh_submissions"),
        }
    }
}

impl FromStr for JobAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_or_update_profile" => Ok(JobAction::AddOrUpdateProfile),
            "refresh_submissions" => Ok(JobAction::RefreshSubmissions),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Queued → Running → Completed/Failed
/// Queued → Rejected（准入失败）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已入队
    #[default]
    Queued,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 准入被拒绝
    Rejected,
}

impl JobStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Rejected
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "rejected" => Ok(JobStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobStatus, to: JobStatus },
}

impl SyncJob {
    /// 创建一个新的同步任务
    ///
    /// # 参数
    ///
    /// * `user_id` - 用户ID
    /// * `site` - 站点标识
    /// * `action` - 请求的动作
    pub fn new(user_id: Uuid, site: impl Into<String>, action: JobAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            site: site.into().to_lowercase(),
            action,
            enqueued_at: Utc::now(),
            status: JobStatus::Queued,
            started_at: None,
            finished_at: None,
            failure_reason: None,
        }
    }

    /// 任务对应的 (用户, 站点) 键
    pub fn key(&self) -> (Uuid, String) {
        (self.user_id, self.site.clone())
    }

    /// 开始执行
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// 标记完成
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(JobStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// 标记失败
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(JobStatus::Failed)?;
        self.finished_at = Some(Utc::now());
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// 标记准入拒绝
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(JobStatus::Rejected)?;
        self.finished_at = Some(Utc::now());
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Rejected)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        );
        if !allowed {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
