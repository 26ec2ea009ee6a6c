// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 编排注册表、队列和仓库完成请求路径上的操作
pub mod profile_sync_use_case;
