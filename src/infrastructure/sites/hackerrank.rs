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
use crate::infrastructure::sites::client::{endpoint, SiteClient};
use crate::utils::url_utils::absolutize;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const SITE: &str = "hackerrank";
pub const DEFAULT_ORIGIN: &str = "https://www.hackerrank.com";

/// 单页提交上限
const SUBMISSION_PAGE_LIMIT: &str = "1000";

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    model: Option<ProfileModel>,
}

#[derive(Debug, Deserialize)]
struct ProfileModel {
    #[serde(default)]
    name: Option<String>,
    username: Option<String>,
    #[serde(default)]
    school: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmissionsEnvelope {
    models: Vec<HackerRankSubmission>,
}

#[derive(Debug, Deserialize)]
struct HackerRankSubmission {
    name: String,
    url: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    con_slug: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContestsEnvelope {
    models: Vec<HackerRankContest>,
    #[serde(default)]
    #[allow(dead_code)]
    total: i64,
}

#[derive(Debug, Deserialize)]
struct HackerRankContest {
    name: String,
    #[serde(default)]
    rated: bool,
    epoch_starttime: i64,
    epoch_endtime: i64,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct RatingEnvelope {
    models: Vec<RatingModel>,
}

#[derive(Debug, Deserialize)]
struct RatingModel {
    events: Vec<RatingEvent>,
}

#[derive(Debug, Deserialize)]
struct RatingEvent {
    contest_name: String,
    date: String,
    rating: f64,
}

/// HackerRank 适配器
///
/// 通过 REST 接口获取资料、最近通过的题目、近期比赛和 ELO 积分曲线
pub struct HackerRankAdapter {
    client: Arc<SiteClient>,
    origin: Url,
    handle: String,
    ctx: CancellationToken,
}

impl HackerRankAdapter {
    pub fn new(client: Arc<SiteClient>, origin: Url, handle: String, ctx: CancellationToken) -> Self {
        Self {
            client,
            origin,
            handle,
            ctx,
        }
    }

    fn profile_url(&self) -> Result<Url, SiteError> {
        endpoint(
            SITE,
            &self.origin,
            &["rest", "contests", "master", "hackers", self.handle.as_str(), "profile"],
            &[],
        )
    }

    fn to_submission(&self, raw: HackerRankSubmission) -> Result<Submission, SiteError> {
        let url = absolutize(&self.origin, &raw.url)
            .map_err(|e| SiteError::parse(SITE, format!("invalid submission url: {}", e), &raw.url))?;
        Ok(Submission {
            contest: raw.con_slug.unwrap_or_else(|| "master".to_string()),
            problem: raw.name,
            url,
            status: raw.status.unwrap_or_else(|| "Accepted".to_string()),
            created_at: raw.created_at,
            site: SITE.to_string(),
        })
    }
}

#[async_trait]
impl SiteAdapter for HackerRankAdapter {
    fn site(&self) -> &'static str {
        SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        let response = self.client.get(SITE, self.profile_url()?, &self.ctx).await?;
        if response.is_not_found() {
            return classify_probe(Err(SiteError::not_found(SITE, &self.handle)));
        }
        response.ensure_success(SITE)?;
        Ok(true)
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        let response = self.client.get(SITE, self.profile_url()?, &self.ctx).await?;
        if response.is_not_found() {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        let response = response.ensure_success(SITE)?;
        let envelope: ProfileEnvelope = response.json(SITE)?;
        let model = envelope
            .model
            .ok_or_else(|| SiteError::parse(SITE, "missing field `model`", &response.body))?;
        let username = model
            .username
            .ok_or_else(|| SiteError::parse(SITE, "missing field `model.username`", &response.body))?;

        Ok(ProfileInfo {
            name: model.name.unwrap_or_default(),
            username,
            school: model.school.unwrap_or_default(),
        })
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        let url = endpoint(
            SITE,
            &self.origin,
            &["rest", "hackers", self.handle.as_str(), "recent_challenges"],
            &[("limit", SUBMISSION_PAGE_LIMIT), ("response_version", "v1")],
        )?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        if response.is_not_found() {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        let mut models = response.ensure_success(SITE)?.json::<SubmissionsEnvelope>(SITE)?.models;

        let index = cutoff_index_by(&models, after, |s| s.created_at);
        models.truncate(index);
        models
            .into_iter()
            .map(|raw| self.to_submission(raw))
            .collect()
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        let url = endpoint(
            SITE,
            &self.origin,
            &["rest", "contests", "upcoming"],
            &[("offset", "0"), ("limit", "20"), ("contest_slug", "active")],
        )?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        let envelope: ContestsEnvelope = response.ensure_success(SITE)?.json(SITE)?;

        Ok(envelope
            .models
            .into_iter()
            .map(|c| Contest {
                name: c.name,
                rated: c.rated,
                start_epoch: c.epoch_starttime,
                end_epoch: c.epoch_endtime,
                archived: c.archived,
            })
            .collect())
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        let url = endpoint(
            SITE,
            &self.origin,
            &["rest", "hackers", self.handle.as_str(), "rating_histories_elo"],
            &[],
        )?;
        let response = self.client.get(SITE, url, &self.ctx).await?;
        if response.is_not_found() {
            return Err(SiteError::not_found(SITE, &self.handle));
        }
        let envelope: RatingEnvelope = response.ensure_success(SITE)?.json(SITE)?;

        let mut points: Vec<RatingPoint> = envelope
            .models
            .into_iter()
            .next()
            .map(|model| model.events)
            .unwrap_or_default()
            .into_iter()
            .map(|event| RatingPoint {
                contest_name: event.contest_name,
                date: event.date,
                rating: event.rating,
            })
            .collect();
        sort_rating_history(&mut points);
        Ok(points)
    }
}
