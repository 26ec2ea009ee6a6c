// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff};
use crate::domain::site::cutoff::{newer_than, sort_newest_first};
use crate::domain::site::{SiteAdapter, SiteError};
use crate::infrastructure::sites::client::{
    element_text, endpoint, infer_rated, selector, SiteClient,
};
use crate::utils::url_utils::absolutize;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const SITE: &str = "spoj";
pub const DEFAULT_ORIGIN: &str = "https://www.spoj.com";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SPOJ 适配器
///
/// 全部数据来自 HTML 页面。SPOJ 对不存在的用户同样返回 200，
/// 只能通过页面中是否有资料块来判断。
pub struct SpojAdapter {
    client: Arc<SiteClient>,
    origin: Url,
    handle: String,
    ctx: CancellationToken,
}

impl SpojAdapter {
    pub fn new(client: Arc<SiteClient>, origin: Url, handle: String, ctx: CancellationToken) -> Self {
        Self {
            client,
            origin,
            handle,
            ctx,
        }
    }

    async fn get_page(&self, segments: &[&str]) -> Result<String, SiteError> {
        let url = endpoint(SITE, &self.origin, segments, &[])?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        Ok(response.ensure_success(SITE)?.body)
    }

    /// 用户页，404 视为用户不存在
    async fn profile_page(&self) -> Result<String, SiteError> {
        let url = endpoint(SITE, &self.origin, &["users", self.handle.as_str(), ""], &[])?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        if response.is_not_found() {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        Ok(response.ensure_success(SITE)?.body)
    }

    /// 解析资料块，页面中没有资料块时返回 `None`
    fn parse_profile(&self, body: &str) -> Result<Option<ProfileInfo>, SiteError> {
        let document = Html::parse_document(body);
        let block_selector = selector(SITE, "#user-profile-left")?;
        let Some(block) = document.select(&block_selector).next() else {
            return Ok(None);
        };

        let name = first_text(block, "h3")?.unwrap_or_default();
        let username = first_text(block, "h4")?
            .map(|h| h.trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SiteError::parse(SITE, "missing username in profile block", body))?;

        let paragraph_selector = selector(SITE, "p")?;
        let school = block
            .select(&paragraph_selector)
            .map(element_text)
            .find(|text| text.contains("Institution:"))
            .and_then(|text| text.split_once("Institution:").map(|(_, v)| v.trim().to_string()))
            .unwrap_or_default();

        Ok(Some(ProfileInfo {
            name,
            username,
            school,
        }))
    }

    fn parse_submissions(&self, body: &str) -> Result<Vec<Submission>, SiteError> {
        let document = Html::parse_document(body);
        let row_selector = selector(SITE, "table.problems tbody tr")?;
        let date_selector = selector(SITE, "td.status_sm span")?;
        let link_selector = selector(SITE, "td.sproblem a")?;
        let status_selector = selector(SITE, "td.statusres")?;

        let mut submissions = Vec::new();
        for row in document.select(&row_selector) {
            let date = row
                .select(&date_selector)
                .next()
                .map(element_text)
                .ok_or_else(|| SiteError::parse(SITE, "submission row without date", body))?;
            let created_at = parse_date(&date, body)?;

            let link = row
                .select(&link_selector)
                .next()
                .ok_or_else(|| SiteError::parse(SITE, "submission row without problem link", body))?;
            let href = link.value().attr("href").unwrap_or_default();
            let url = absolutize(&self.origin, href)
                .map_err(|e| SiteError::parse(SITE, format!("invalid problem url: {}", e), href))?;

            let status = row
                .select(&status_selector)
                .next()
                .map(element_text)
                .unwrap_or_default();

            submissions.push(Submission {
                contest: "SPOJ".to_string(),
                problem: element_text(link),
                url,
                status,
                created_at,
                site: SITE.to_string(),
            });
        }
        Ok(submissions)
    }

    fn parse_contests(&self, body: &str) -> Result<Vec<Contest>, SiteError> {
        let document = Html::parse_document(body);
        let row_selector = selector(SITE, "table.table tbody tr")?;
        let cell_selector = selector(SITE, "td")?;

        let mut contests = Vec::new();
        for row in document.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            if cells.len() < 3 {
                continue;
            }
            let name = element_text(cells[0]);
            let start = parse_date(&element_text(cells[1]), body)?;
            let end = parse_date(&element_text(cells[2]), body)?;
            contests.push(Contest {
                rated: infer_rated(&name),
                name,
                start_epoch: start.timestamp(),
                end_epoch: end.timestamp(),
                archived: false,
            });
        }
        Ok(contests)
    }
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>, SiteError> {
    let selector = selector(SITE, css)?;
    Ok(scope.select(&selector).next().map(element_text))
}

fn parse_date(text: &str, body: &str) -> Result<DateTime<Utc>, SiteError> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| SiteError::parse(SITE, format!("invalid date `{}`", text), body))
}

#[async_trait]
impl SiteAdapter for SpojAdapter {
    fn site(&self) -> &'static str {
        SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        let body = match self.profile_page().await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(self.parse_profile(&body)?.is_some())
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        let body = self.profile_page().await?;
        self.parse_profile(&body)?
            .ok_or_else(|| SiteError::not_found(SITE, &self.handle))
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        let body = self
            .get_page(&["status", self.handle.as_str(), "all", ""])
            .await?;
        let mut submissions = self.parse_submissions(&body)?;
        sort_newest_first(&mut submissions);
        Ok(newer_than(submissions, after))
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        let body = self.get_page(&["contests", ""]).await?;
        self.parse_contests(&body)
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        // SPOJ 没有积分体系
        Ok(Vec::new())
    }
}
