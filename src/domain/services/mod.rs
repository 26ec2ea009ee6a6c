// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 同步引擎（sync_engine）：按截止时间增量拉取单个站点的数据
/// - 通知（notifier）：同步完成后的通知协作方接口
pub mod notifier;
pub mod sync_engine;
