// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理和工作器管理功能
/// 包括同步任务执行、工作器生命周期管理和有界后台任务池
pub mod background;
pub mod manager;
pub mod sync_worker;
pub mod worker;

pub use worker::Worker;
