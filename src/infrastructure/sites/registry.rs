// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{SiteSettings, SitesSettings};
use crate::domain::site::SiteAdapter;
use crate::infrastructure::sites::client::SiteClient;
use crate::infrastructure::sites::{codechef, codeforces, hackerrank, leetcode, spoj};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// 适配器工厂
///
/// 根据句柄和请求上下文构造适配器实例，构造过程不做任何网络 I/O
pub type AdapterFactory =
    Arc<dyn Fn(String, CancellationToken) -> Arc<dyn SiteAdapter> + Send + Sync>;

/// 注册表错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown site '{0}'")]
    UnknownSite(String),

    #[error("invalid origin '{origin}' for site '{site}': {message}")]
    InvalidOrigin {
        site: String,
        origin: String,
        message: String,
    },
}

/// 适配器注册表
///
/// 启动时构建一次，之后只读；站点标识大小写不敏感
#[derive(Clone)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("sites", &self.sites())
            .finish()
    }
}

impl AdapterRegistry {
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::default()
    }

    /// 按配置注册所有启用的站点
    pub fn from_settings(
        settings: &SitesSettings,
        client: Arc<SiteClient>,
    ) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();

        if let Some(origin) = enabled_origin(hackerrank::SITE, &settings.hackerrank)? {
            let client = client.clone();
            builder = builder.register(hackerrank::SITE, move |handle, ctx| {
                Arc::new(hackerrank::HackerRankAdapter::new(
                    client.clone(),
                    origin.clone(),
                    handle,
                    ctx,
                ))
            });
        }
        if let Some(origin) = enabled_origin(codeforces::SITE, &settings.codeforces)? {
            let client = client.clone();
            builder = builder.register(codeforces::SITE, move |handle, ctx| {
                Arc::new(codeforces::CodeforcesAdapter::new(
                    client.clone(),
                    origin.clone(),
                    handle,
                    ctx,
                ))
            });
        }
        if let Some(origin) = enabled_origin(codechef::SITE, &settings.codechef)? {
            let client = client.clone();
            builder = builder.register(codechef::SITE, move |handle, ctx| {
                Arc::new(codechef::CodeChefAdapter::new(
                    client.clone(),
                    origin.clone(),
                    handle,
                    ctx,
                ))
            });
        }
        if let Some(origin) = enabled_origin(spoj::SITE, &settings.spoj)? {
            let client = client.clone();
            builder = builder.register(spoj::SITE, move |handle, ctx| {
                Arc::new(spoj::SpojAdapter::new(client.clone(), origin.clone(), handle, ctx))
            });
        }
        if let Some(origin) = enabled_origin(leetcode::SITE, &settings.leetcode)? {
            let client = client.clone();
            builder = builder.register(leetcode::SITE, move |handle, ctx| {
                Arc::new(leetcode::LeetCodeAdapter::new(
                    client.clone(),
                    origin.clone(),
                    handle,
                    ctx,
                ))
            });
        }

        let registry = builder.build();
        info!(sites = ?registry.sites(), "Adapter registry initialized");
        Ok(registry)
    }

    /// 为 (站点, 句柄) 构造适配器
    pub fn resolve(
        &self,
        site: &str,
        handle: &str,
        ctx: CancellationToken,
    ) -> Result<Arc<dyn SiteAdapter>, RegistryError> {
        let factory = self
            .factories
            .get(&site.to_lowercase())
            .ok_or_else(|| RegistryError::UnknownSite(site.to_string()))?;
        Ok(factory(handle.to_string(), ctx))
    }

    pub fn is_supported(&self, site: &str) -> bool {
        self.factories.contains_key(&site.to_lowercase())
    }

    /// 已注册的站点标识，按字母序排列
    pub fn sites(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// 注册表构建器
#[derive(Default)]
pub struct AdapterRegistryBuilder {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterRegistryBuilder {
    pub fn register<F>(mut self, site: &str, factory: F) -> Self
    where
        F: Fn(String, CancellationToken) -> Arc<dyn SiteAdapter> + Send + Sync + 'static,
    {
        self.factories
            .insert(site.to_lowercase(), Arc::new(factory));
        self
    }

    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            factories: self.factories,
        }
    }
}

fn enabled_origin(site: &str, settings: &SiteSettings) -> Result<Option<Url>, RegistryError> {
    if !settings.enabled {
        return Ok(None);
    }
    Url::parse(&settings.origin)
        .map(Some)
        .map_err(|e| RegistryError::InvalidOrigin {
            site: site.to_string(),
            origin: settings.origin.clone(),
            message: e.to_string(),
        })
}
