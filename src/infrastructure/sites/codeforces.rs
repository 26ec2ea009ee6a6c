// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{
    sort_rating_history, Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff,
};
use crate::domain::site::adapter::classify_probe;
use crate::domain::site::cutoff::cutoff_index_by;
use crate::domain::site::{SiteAdapter, SiteError};
use crate::infrastructure::sites::client::{endpoint, infer_rated, SiteClient, SiteResponse};
use crate::utils::url_utils::absolutize;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const SITE: &str = "codeforces";
pub const DEFAULT_ORIGIN: &str = "https://codeforces.com";

/// 单页提交上限
const SUBMISSION_PAGE_LIMIT: &str = "100";

/// gym 比赛的 ID 起始值
const GYM_CONTEST_ID_START: i64 = 100_000;

/// Codeforces API 统一响应包装
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfUser {
    handle: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    organization: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfSubmission {
    #[serde(default)]
    contest_id: Option<i64>,
    creation_time_seconds: i64,
    problem: CfProblem,
    #[serde(default)]
    verdict: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfProblem {
    #[serde(default)]
    contest_id: Option<i64>,
    index: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfContest {
    name: String,
    phase: String,
    duration_seconds: i64,
    #[serde(default)]
    start_time_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfRatingChange {
    contest_name: String,
    rating_update_time_seconds: i64,
    new_rating: i64,
}

/// Codeforces 适配器
///
/// 使用官方 JSON API。句柄不存在时接口返回 HTTP 400 和 `FAILED` 状态。
pub struct CodeforcesAdapter {
    client: Arc<SiteClient>,
    origin: Url,
    handle: String,
    ctx: CancellationToken,
}

impl CodeforcesAdapter {
    pub fn new(client: Arc<SiteClient>, origin: Url, handle: String, ctx: CancellationToken) -> Self {
        Self {
            client,
            origin,
            handle,
            ctx,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SiteError> {
        let url = endpoint(SITE, &self.origin, &["api", method], query)?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        self.unwrap_envelope(response)
    }

    fn unwrap_envelope<T: DeserializeOwned>(&self, response: SiteResponse) -> Result<T, SiteError> {
        if response.status.is_server_error() || response.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SiteError::transport(
                SITE,
                format!("unexpected status {}", response.status),
            ));
        }

        let envelope = match serde_json::from_str::<ApiEnvelope<T>>(&response.body) {
            Ok(envelope) => envelope,
            Err(_) if !response.status.is_success() => {
                return Err(SiteError::transport(
                    SITE,
                    format!("unexpected status {}", response.status),
                ))
            }
            Err(e) => return Err(SiteError::parse(SITE, e.to_string(), &response.body)),
        };

        match envelope.status.as_str() {
            "OK" => envelope
                .result
                .ok_or_else(|| SiteError::parse(SITE, "missing field `result`", &response.body)),
            "FAILED" => {
                let comment = envelope.comment.unwrap_or_default();
                if comment.to_lowercase().contains("not found") {
                    Err(SiteError::not_found(SITE, &self.handle))
                } else {
                    Err(SiteError::transport(SITE, format!("api call failed: {}", comment)))
                }
            }
            other => Err(SiteError::parse(
                SITE,
                format!("unknown envelope status `{}`", other),
                &response.body,
            )),
        }
    }

    async fn fetch_user(&self) -> Result<CfUser, SiteError> {
        let users: Vec<CfUser> = self
            .call("user.info", &[("handles", self.handle.as_str())])
            .await?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| SiteError::parse(SITE, "empty `result` for user.info", ""))
    }

    fn to_submission(&self, raw: CfSubmission) -> Result<Submission, SiteError> {
        let created_at = timestamp(raw.creation_time_seconds)?;
        let contest_id = raw.contest_id.or(raw.problem.contest_id);
        let path = match contest_id {
            Some(id) if id >= GYM_CONTEST_ID_START => format!("/gym/{}/problem/{}", id, raw.problem.index),
            Some(id) => format!("/contest/{}/problem/{}", id, raw.problem.index),
            None => "/problemset".to_string(),
        };
        let url = absolutize(&self.origin, &path)
            .map_err(|e| SiteError::parse(SITE, format!("invalid problem url: {}", e), &path))?;
        let problem = match contest_id {
            Some(id) => format!("{}{} - {}", id, raw.problem.index, raw.problem.name),
            None => format!("{} - {}", raw.problem.index, raw.problem.name),
        };

        Ok(Submission {
            contest: contest_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "problemset".to_string()),
            problem,
            url,
            status: raw.verdict.unwrap_or_else(|| "TESTING".to_string()),
            created_at,
            site: SITE.to_string(),
        })
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, SiteError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| SiteError::parse(SITE, format!("invalid timestamp {}", seconds), ""))
}

#[async_trait]
impl SiteAdapter for CodeforcesAdapter {
    fn site(&self) -> &'static str {
        SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        classify_probe(self.fetch_user().await.map(|_| ()))
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        let user = self.fetch_user().await?;
        let name = format!(
            "{} {}",
            user.first_name.unwrap_or_default(),
            user.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();

        Ok(ProfileInfo {
            name,
            username: user.handle,
            school: user.organization.unwrap_or_default(),
        })
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        let mut raw: Vec<CfSubmission> = self
            .call(
                "user.status",
                &[
                    ("handle", self.handle.as_str()),
                    ("from", "1"),
                    ("count", SUBMISSION_PAGE_LIMIT),
                ],
            )
            .await?;

        let index = cutoff_index_by(&raw, after, |s| {
            Utc.timestamp_opt(s.creation_time_seconds, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        raw.truncate(index);
        raw.into_iter().map(|s| self.to_submission(s)).collect()
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        let contests: Vec<CfContest> = self.call("contest.list", &[("gym", "false")]).await?;

        contests
            .into_iter()
            .filter(|c| c.phase == "BEFORE" || c.phase == "CODING")
            .map(|c| {
                let start = c.start_time_seconds.unwrap_or_default();
                let end = start.checked_add(c.duration_seconds).ok_or_else(|| {
                    SiteError::parse(SITE, format!("contest end overflows for `{}`", c.name), "")
                })?;
                Ok(Contest {
                    rated: infer_rated(&c.name),
                    name: c.name,
                    start_epoch: start,
                    end_epoch: end,
                    archived: false,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        let changes: Vec<CfRatingChange> = self
            .call("user.rating", &[("handle", self.handle.as_str())])
            .await?;

        let mut points = changes
            .into_iter()
            .map(|c| {
                Ok(RatingPoint {
                    contest_name: c.contest_name,
                    date: timestamp(c.rating_update_time_seconds)?
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    rating: c.new_rating as f64,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()?;
        sort_rating_history(&mut points);
        Ok(points)
    }
}
