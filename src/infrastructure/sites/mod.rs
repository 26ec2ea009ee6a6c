// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 站点适配器模块
///
/// 每个外部站点一个适配器，共享 `SiteClient` 请求通道，
/// 由 `AdapterRegistry` 按站点标识分发。
pub mod client;
pub mod codechef;
pub mod codeforces;
pub mod hackerrank;
pub mod leetcode;
pub mod registry;
pub mod spoj;

pub use client::SiteClient;
pub use registry::{AdapterFactory, AdapterRegistry, RegistryError};
