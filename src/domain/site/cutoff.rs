// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{Submission, SyncCutoff};
use chrono::{DateTime, Utc};

/// 计算增量截止位置
///
/// 输入必须按提交时间降序排列。从头扫描到第一条不晚于 `after` 的记录即停止，
/// 复杂度与新增条数成正比。找不到更旧的记录时全部视为新增。
pub fn cutoff_index_by<T, F>(items: &[T], after: SyncCutoff, created_at: F) -> usize
where
    F: Fn(&T) -> DateTime<Utc>,
{
    match after {
        None => items.len(),
        Some(after) => items
            .iter()
            .position(|item| created_at(item) <= after)
            .unwrap_or(items.len()),
    }
}

pub fn cutoff_index(submissions: &[Submission], after: SyncCutoff) -> usize {
    cutoff_index_by(submissions, after, |s| s.created_at)
}

/// 保留严格晚于 `after` 的前缀
pub fn newer_than(mut submissions: Vec<Submission>, after: SyncCutoff) -> Vec<Submission> {
    let index = cutoff_index(&submissions, after);
    submissions.truncate(index);
    submissions
}

/// 对来源顺序不可靠的站点，先按时间降序稳定排序
pub fn sort_newest_first(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
