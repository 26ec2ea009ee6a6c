// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 站点领域模块
///
/// 定义外部站点适配器必须满足的能力契约、错误分类
/// 以及增量截止算法
pub mod adapter;
pub mod cutoff;

pub use adapter::{SiteAdapter, SiteError};
