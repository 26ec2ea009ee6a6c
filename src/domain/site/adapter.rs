// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff};
use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

/// 日志中保留的最大负载字节数
const PAYLOAD_CONTEXT_LIMIT: usize = 512;

/// 站点适配器错误类型
///
/// 区分三类失败：传输失败、负载结构不符以及站点明确报告的句柄不存在。
/// 只有 `NotFound` 可以作为用户可见的校验失败。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SiteError {
    /// 网络错误、超时、取消或与"不存在"无关的非 2xx 响应
    #[error("{site}: transport error: {message}")]
    Transport { site: String, message: String },

    /// 负载与预期结构不符
    #[error("{site}: unexpected payload: {message}")]
    Parse {
        site: String,
        message: String,
        payload: String,
    },

    /// 站点确认句柄不存在
    #[error("{site}: handle '{handle}' not found")]
    NotFound { site: String, handle: String },
}

impl SiteError {
    pub fn transport(site: &str, message: impl Into<String>) -> Self {
        SiteError::Transport {
            site: site.to_string(),
            message: message.into(),
        }
    }

    /// 构造解析错误并记录带负载上下文的错误日志
    pub fn parse(site: &str, message: impl Into<String>, payload: &str) -> Self {
        let message = message.into();
        let payload = truncate_payload(payload);
        error!(site, %message, payload = %payload, "Site payload did not match expected schema");
        SiteError::Parse {
            site: site.to_string(),
            message,
            payload,
        }
    }

    pub fn not_found(site: &str, handle: &str) -> Self {
        SiteError::NotFound {
            site: site.to_string(),
            handle: handle.to_string(),
        }
    }

    /// 判断错误是否可以通过重新入队重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, SiteError::Transport { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SiteError::NotFound { .. })
    }

    /// 面向用户的错误描述，不包含任何负载细节
    pub fn user_message(&self) -> String {
        match self {
            SiteError::NotFound { site, handle } => {
                format!("handle '{}' does not exist on {}", handle, site)
            }
            SiteError::Transport { site, .. } => {
                format!("{} is currently unreachable, try again later", site)
            }
            SiteError::Parse { .. } => "internal error while reading site data".to_string(),
        }
    }
}

fn truncate_payload(payload: &str) -> String {
    if payload.len() <= PAYLOAD_CONTEXT_LIMIT {
        return payload.to_string();
    }
    let mut end = PAYLOAD_CONTEXT_LIMIT;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &payload[..end])
}

/// 将存在性探测的结果归类为 `check_handle` 的返回值
///
/// `NotFound` 映射为 `Ok(false)`，其它错误原样返回
pub fn classify_probe(result: Result<(), SiteError>) -> Result<bool, SiteError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// 站点适配器特质
///
/// 每个实例绑定一个 (站点, 句柄) 对以及一个可取消的请求上下文。
/// 构造时不进行任何网络 I/O。
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// 站点标识
    fn site(&self) -> &'static str;

    /// 绑定的句柄
    fn handle(&self) -> &str;

    /// 轻量级存在性探测
    ///
    /// 站点报告不存在时返回 `Ok(false)`，传输或解析失败返回 `Err`
    async fn check_handle(&self) -> Result<bool, SiteError>;

    /// 获取规范化的个人资料
    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError>;

    /// 获取严格晚于 `after` 的提交，最新的在前，URL 均为绝对地址
    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError>;

    /// 获取当前及即将开始的比赛，保持站点给出的顺序
    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError>;

    /// 获取按日期升序排列的积分曲线
    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError>;
}
