// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：资料、提交和同步任务
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：同步引擎和通知接口
/// - 站点（site）：站点适配器契约、错误分类和增量截止规则
pub mod models;
pub mod repositories;
pub mod services;
pub mod site;
