// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 同步截止时间
///
/// `None` 表示从未同步过，此时适配器返回站点提供的完整历史
pub type SyncCutoff = Option<DateTime<Utc>>;

/// 站点账号句柄
///
/// 唯一标识用户在某个外部站点上的账号，绑定到用户后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    /// 站点标识，例如 `hackerrank`
    pub site: String,
    /// 站点用户名
    pub username: String,
}

impl Handle {
    pub fn new(site: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            site: site.into().to_lowercase(),
            username: username.into(),
        }
    }
}

/// 规范化的个人资料
///
/// 每个 (用户, 站点) 仅有一份，缺失的可选字段为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// 显示名称
    pub name: String,
    /// 站点用户名
    pub username: String,
    /// 学校或机构
    pub school: String,
}

/// 规范化的提交记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// 所属比赛名称
    pub contest: String,
    /// 题目引用
    pub problem: String,
    /// 绝对URL
    pub url: String,
    /// 评测结果
    pub status: String,
    /// 提交时间
    pub created_at: DateTime<Utc>,
    /// 来源站点
    pub site: String,
}

/// 站点比赛列表快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub name: String,
    pub rated: bool,
    /// 开始时间（Unix 秒）
    pub start_epoch: i64,
    /// 结束时间（Unix 秒）
    pub end_epoch: i64,
    pub archived: bool,
}

/// 积分曲线上的一个点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub contest_name: String,
    /// 日期字符串，格式与来源站点保持一致（RFC 3339 或 `YYYY-MM-DD`）
    pub date: String,
    pub rating: f64,
}

/// 按日期升序排列积分曲线
///
/// 日期字符串均为 ISO 8601 前缀格式，字典序即时间序
pub fn sort_rating_history(points: &mut [RatingPoint]) {
    points.sort_by(|a, b| a.date.cmp(&b.date));
}
