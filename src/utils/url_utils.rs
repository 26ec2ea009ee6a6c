// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 基于站点固定源地址绝对化URL，已是绝对地址时原样返回
pub fn absolutize(origin: &Url, path: &str) -> Result<String, ParseError> {
    resolve_url(origin, path.trim()).map(String::from)
}

/// 判断字符串是否为带协议的绝对URL
pub fn is_absolute(url: &str) -> bool {
    Url::parse(url).map(|u| u.has_host()).unwrap_or(false)
}
