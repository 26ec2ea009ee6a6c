// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求路径上的用例和数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、站点适配器契约、同步引擎和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供站点适配器、内存仓库和指标等外部集成
pub mod infrastructure;

/// 队列模块
///
/// 实现同步任务的准入和定时调度
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现后台同步任务处理和工作器管理
pub mod workers;
