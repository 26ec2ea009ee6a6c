// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{
    sort_rating_history, Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff,
};
use crate::domain::site::cutoff::{newer_than, sort_newest_first};
use crate::domain::site::adapter::classify_probe;
use crate::domain::site::{SiteAdapter, SiteError};
use crate::infrastructure::sites::client::{
    element_text, endpoint, infer_rated, selector, SiteClient, SiteResponse,
};
use crate::utils::url_utils::absolutize;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const SITE: &str = "codechef";
pub const DEFAULT_ORIGIN: &str = "https://www.codechef.com";

/// 提交列表中时间的格式，例如 `10:36 PM 12/05/24`
const SUBMISSION_TIME_FORMAT: &str = "%I:%M %p %d/%m/%y";

/// CodeChef 页面时间均为印度标准时间
const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

static ALL_RATING: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)var\s+all_rating\s*=\s*(\[.*?\])\s*;").ok());

#[derive(Debug, Deserialize)]
struct RecentSubmissionsEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    max_page: i64,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ContestListEnvelope {
    #[serde(default)]
    present_contests: Vec<CodeChefContest>,
    #[serde(default)]
    future_contests: Vec<CodeChefContest>,
}

#[derive(Debug, Deserialize)]
struct CodeChefContest {
    contest_name: String,
    #[serde(default)]
    #[allow(dead_code)]
    contest_code: String,
    contest_start_date_iso: DateTime<FixedOffset>,
    contest_end_date_iso: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
struct CodeChefRating {
    name: String,
    end_date: String,
    rating: String,
}

/// CodeChef 适配器
///
/// 资料与积分来自个人主页 HTML，提交来自 `recent/user` 接口返回的表格片段，
/// 比赛列表来自 JSON 接口。
pub struct CodeChefAdapter {
    client: Arc<SiteClient>,
    origin: Url,
    handle: String,
    ctx: CancellationToken,
}

impl CodeChefAdapter {
    pub fn new(client: Arc<SiteClient>, origin: Url, handle: String, ctx: CancellationToken) -> Self {
        Self {
            client,
            origin,
            handle,
            ctx,
        }
    }

    /// 获取个人主页
    ///
    /// 404 或被重定向离开 `/users/` 都表示句柄不存在
    async fn profile_page(&self) -> Result<SiteResponse, SiteError> {
        let url = endpoint(SITE, &self.origin, &["users", self.handle.as_str()], &[])?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        if response.is_not_found() || !response.final_url.path().starts_with("/users/") {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        response.ensure_success(SITE)
    }

    fn parse_profile(&self, body: &str) -> Result<ProfileInfo, SiteError> {
        let document = Html::parse_document(body);
        let name_selector = selector(SITE, ".user-details-container h1.h2-style")?;
        let item_selector = selector(SITE, ".user-details li")?;
        let label_selector = selector(SITE, "label")?;
        let value_selector = selector(SITE, "span")?;

        let name = document
            .select(&name_selector)
            .next()
            .map(element_text)
            .ok_or_else(|| SiteError::parse(SITE, "missing profile header", body))?;

        let school = document
            .select(&item_selector)
            .find(|item| {
                item.select(&label_selector)
                    .next()
                    .map(|label| element_text(label).starts_with("Institution"))
                    .unwrap_or(false)
            })
            .and_then(|item| item.select(&value_selector).next())
            .map(element_text)
            .unwrap_or_default();

        Ok(ProfileInfo {
            name,
            username: self.handle.clone(),
            school,
        })
    }

    fn parse_submissions(&self, fragment: &str) -> Result<Vec<Submission>, SiteError> {
        let document = Html::parse_fragment(fragment);
        let row_selector = selector(SITE, "tbody tr")?;
        let cell_selector = selector(SITE, "td")?;
        let titled_selector = selector(SITE, "span[title]")?;
        let link_selector = selector(SITE, "a[href]")?;
        let ist = FixedOffset::east_opt(IST_OFFSET_SECONDS)
            .ok_or_else(|| SiteError::parse(SITE, "invalid IST offset", ""))?;

        let mut submissions = Vec::new();
        for row in document.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            // "No Recent Activity" 占位行只有一个单元格
            if cells.len() < 3 {
                continue;
            }

            let time = cells[0]
                .select(&titled_selector)
                .next()
                .and_then(|span| span.value().attr("title"))
                .ok_or_else(|| SiteError::parse(SITE, "submission row without time", fragment))?;
            let created_at = NaiveDateTime::parse_from_str(time.trim(), SUBMISSION_TIME_FORMAT)
                .ok()
                .and_then(|naive| naive.and_local_timezone(ist).single())
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| {
                    SiteError::parse(SITE, format!("invalid submission time `{}`", time), fragment)
                })?;

            let link = cells[1]
                .select(&link_selector)
                .next()
                .ok_or_else(|| SiteError::parse(SITE, "submission row without problem link", fragment))?;
            let href = link.value().attr("href").unwrap_or_default();
            let url = absolutize(&self.origin, href)
                .map_err(|e| SiteError::parse(SITE, format!("invalid problem url: {}", e), href))?;

            let status = cells[2]
                .select(&titled_selector)
                .next()
                .and_then(|span| span.value().attr("title"))
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| element_text(cells[2]));

            submissions.push(Submission {
                contest: "CodeChef".to_string(),
                problem: element_text(link),
                url,
                status,
                created_at,
                site: SITE.to_string(),
            });
        }
        Ok(submissions)
    }

    fn parse_rating(&self, body: &str) -> Result<Vec<RatingPoint>, SiteError> {
        let pattern = ALL_RATING
            .as_ref()
            .ok_or_else(|| SiteError::parse(SITE, "invalid rating pattern", ""))?;
        // 没有参加过计分比赛的用户页面中不含该变量
        let raw = match pattern.captures(body).and_then(|c| c.get(1)) {
            Some(m) => m.as_str(),
            None => return Ok(Vec::new()),
        };
        let entries: Vec<CodeChefRating> =
            serde_json::from_str(raw).map_err(|e| SiteError::parse(SITE, e.to_string(), raw))?;

        let mut points = entries
            .into_iter()
            .map(|entry| {
                let rating = entry.rating.trim().parse::<f64>().map_err(|_| {
                    SiteError::parse(SITE, format!("invalid rating `{}`", entry.rating), raw)
                })?;
                Ok(RatingPoint {
                    contest_name: entry.name,
                    date: entry.end_date,
                    rating,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()?;
        sort_rating_history(&mut points);
        Ok(points)
    }
}

#[async_trait]
impl SiteAdapter for CodeChefAdapter {
    fn site(&self) -> &'static str {
        SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        classify_probe(self.profile_page().await.map(|_| ()))
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        let response = self.profile_page().await?;
        self.parse_profile(&response.body)
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        let url = endpoint(
            SITE,
            &self.origin,
            &["recent", "user"],
            &[("page", "0"), ("user_handle", self.handle.as_str())],
        )?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        if response.is_not_found() {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        let envelope: RecentSubmissionsEnvelope = response.ensure_success(SITE)?.json(SITE)?;

        let mut submissions = self.parse_submissions(&envelope.content)?;
        sort_newest_first(&mut submissions);
        Ok(newer_than(submissions, after))
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        let url = endpoint(SITE, &self.origin, &["api", "list", "contests", "all"], &[])?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        let envelope: ContestListEnvelope = response.ensure_success(SITE)?.json(SITE)?;

        Ok(envelope
            .present_contests
            .into_iter()
            .chain(envelope.future_contests)
            .map(|c| Contest {
                rated: infer_rated(&c.contest_name),
                name: c.contest_name,
                start_epoch: c.contest_start_date_iso.timestamp(),
                end_epoch: c.contest_end_date_iso.timestamp(),
                archived: false,
            })
            .collect())
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        let response = self.profile_page().await?;
        self.parse_rating(&response.body)
    }
}
