// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::site::SiteError;
use reqwest::StatusCode;
use scraper::{ElementRef, Selector};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// 默认的单次外部请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 站点响应
///
/// 保存状态码、重定向后的最终地址和响应体文本
#[derive(Debug, Clone)]
pub struct SiteResponse {
    pub status: StatusCode,
    pub final_url: Url,
    pub body: String,
}

impl SiteResponse {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// 非 2xx 响应归类为传输错误
    pub fn ensure_success(self, site: &str) -> Result<Self, SiteError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(SiteError::transport(
                site,
                format!("unexpected status {} from {}", self.status, self.final_url),
            ))
        }
    }

    /// 按类型化结构反序列化响应体，失败时携带负载上下文
    pub fn json<T: DeserializeOwned>(&self, site: &str) -> Result<T, SiteError> {
        serde_json::from_str(&self.body).map_err(|e| SiteError::parse(site, e.to_string(), &self.body))
    }
}

/// 站点HTTP客户端
///
/// 所有适配器共享的请求通道：固定超时、统一的错误分类，
/// 并且每个请求都与调用方的取消令牌竞争。
#[derive(Clone)]
pub struct SiteClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for SiteClient {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT)
    }
}

impl SiteClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 发送 GET 请求
    pub async fn get(
        &self,
        site: &str,
        url: Url,
        ctx: &CancellationToken,
    ) -> Result<SiteResponse, SiteError> {
        debug!(site, url = %url, "GET");
        let request = self.client.get(url);
        self.execute(site, request, ctx).await
    }

    /// 发送 JSON POST 请求
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        site: &str,
        url: Url,
        body: &B,
        ctx: &CancellationToken,
    ) -> Result<SiteResponse, SiteError> {
        debug!(site, url = %url, "POST");
        let request = self.client.post(url).json(body);
        self.execute(site, request, ctx).await
    }

    async fn execute(
        &self,
        site: &str,
        request: reqwest::RequestBuilder,
        ctx: &CancellationToken,
    ) -> Result<SiteResponse, SiteError> {
        let timeout = self.timeout;
        let call = async move {
            let response = request
                .send()
                .await
                .map_err(|e| classify_reqwest_error(site, &e, timeout))?;
            let status = response.status();
            let final_url = response.url().clone();
            let body = response
                .text()
                .await
                .map_err(|e| classify_reqwest_error(site, &e, timeout))?;
            Ok(SiteResponse {
                status,
                final_url,
                body,
            })
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(SiteError::transport(site, "request cancelled")),
            result = call => result,
        }
    }
}

fn classify_reqwest_error(site: &str, error: &reqwest::Error, timeout: Duration) -> SiteError {
    if error.is_timeout() {
        SiteError::transport(site, format!("request timed out after {:?}", timeout))
    } else if error.is_connect() {
        SiteError::transport(site, format!("connection failed: {}", error))
    } else {
        SiteError::transport(site, error.to_string())
    }
}

/// 基于站点源地址构造端点URL
///
/// 路径段逐段编码，句柄中的特殊字符不会改变路径结构
pub fn endpoint(
    site: &str,
    origin: &Url,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, SiteError> {
    let mut url = origin.clone();
    url.path_segments_mut()
        .map_err(|_| SiteError::transport(site, format!("origin {} cannot be a base", origin)))?
        .clear()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// 编译 CSS 选择器
pub fn selector(site: &str, css: &str) -> Result<Selector, SiteError> {
    Selector::parse(css).map_err(|e| SiteError::parse(site, format!("invalid selector `{}`: {}", css, e), ""))
}

/// 元素内全部文本，合并空白
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 根据比赛名称推测是否计分
pub fn infer_rated(name: &str) -> bool {
    !name.to_lowercase().contains("unrated")
}
