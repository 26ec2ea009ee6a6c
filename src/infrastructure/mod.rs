// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部站点和运行环境的交互。
///
/// 包含的子模块：
/// - 指标（metrics）：同步任务的计数器与耗时直方图
/// - 仓库实现（repositories）：领域仓库接口的内存实现
/// - 服务（services）：通知等协作方的实现
/// - 站点（sites）：各站点适配器、共享HTTP客户端和注册表
///
/// 基础设施层依赖于领域层的抽象接口，领域层不感知具体实现。
pub mod metrics;
pub mod repositories;
pub mod services;
pub mod sites;
