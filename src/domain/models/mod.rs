// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 个人资料（profile）：句柄、资料、提交、比赛和积分曲线
/// - 同步任务（sync_job）：一次 (用户, 站点) 抓取请求及其状态机
///
/// 所有站点适配器都输出这些规范化类型。
pub mod profile;
pub mod sync_job;
