// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::infrastructure::sites::{codechef, codeforces, hackerrank, leetcode, spoj};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// 环境变量前缀，例如 `PROFILE_SYNC__SYNC__WORKER_COUNT=8`
const ENV_PREFIX: &str = "PROFILE_SYNC";

/// 配置加载错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// 应用程序配置设置
///
/// 包含站点、同步、队列、日志和指标等所有配置项
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// 站点配置
    #[validate(nested)]
    pub sites: SitesSettings,
    /// 同步配置
    #[validate(nested)]
    pub sync: SyncSettings,
    /// 队列配置
    #[validate(nested)]
    pub queue: QueueSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 启动时绑定的句柄
    pub seed_handles: Vec<SeedHandle>,
}

/// 站点配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SitesSettings {
    /// 单次外部请求超时时间（秒）
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    pub hackerrank: SiteSettings,
    pub codeforces: SiteSettings,
    pub codechef: SiteSettings,
    pub spoj: SiteSettings,
    pub leetcode: SiteSettings,
}

impl SitesSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SitesSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            user_agent: format!("profile-sync/{}", env!("CARGO_PKG_VERSION")),
            hackerrank: SiteSettings::enabled(hackerrank::DEFAULT_ORIGIN),
            codeforces: SiteSettings::enabled(codeforces::DEFAULT_ORIGIN),
            codechef: SiteSettings::enabled(codechef::DEFAULT_ORIGIN),
            spoj: SiteSettings::enabled(spoj::DEFAULT_ORIGIN),
            leetcode: SiteSettings::enabled(leetcode::DEFAULT_ORIGIN),
        }
    }
}

/// 单个站点的配置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// 是否注册该站点
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 站点源地址，测试时可指向模拟服务
    pub origin: String,
}

impl SiteSettings {
    pub fn enabled(origin: &str) -> Self {
        Self {
            enabled: true,
            origin: origin.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// 同步配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SyncSettings {
    /// 工作器数量
    #[validate(range(min = 1, max = 256))]
    pub worker_count: usize,
    /// 单个任务的执行上限（秒）
    #[validate(range(min = 1))]
    pub job_timeout_secs: u64,
    /// 定时刷新间隔（秒），0 表示关闭
    pub schedule_interval_secs: u64,
    /// 后台任务并发上限
    #[validate(range(min = 1))]
    pub background_permits: usize,
}

impl SyncSettings {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn schedule_interval(&self) -> Option<Duration> {
        (self.schedule_interval_secs > 0).then(|| Duration::from_secs(self.schedule_interval_secs))
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            worker_count: 4,
            job_timeout_secs: 60,
            schedule_interval_secs: 0,
            background_permits: 16,
        }
    }
}

/// 队列配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct QueueSettings {
    /// 队列容量
    #[validate(range(min = 1))]
    pub capacity: usize,
    /// 保留的终态任务数量
    #[validate(range(min = 1))]
    pub status_retention: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: 256,
            status_retention: 10_000,
        }
    }
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub filter: String,
    /// 是否输出 JSON 格式日志
    pub json: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: "info,profile_sync=debug".to_string(),
            json: false,
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "0.0.0.0:9000".to_string(),
        }
    }
}

/// 启动时预先绑定的句柄
#[derive(Debug, Clone, Deserialize)]
pub struct SeedHandle {
    pub user_id: Uuid,
    pub site: String,
    pub handle: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `PROFILE_SYNC__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(SettingsError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, SettingsError> {
        Self::load_from(Path::new("config"))
    }

    /// 从指定目录加载配置
    pub fn load_from(dir: &Path) -> Result<Self, SettingsError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("sync.worker_count", 4)?
            .set_default("sync.job_timeout_secs", 60)?
            .set_default("sync.schedule_interval_secs", 0)?
            .set_default("queue.capacity", 256)?
            .set_default("telemetry.filter", "info,profile_sync=debug")?
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&env)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
