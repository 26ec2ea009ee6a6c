// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{
    sort_rating_history, Contest, ProfileInfo, RatingPoint, Submission, SyncCutoff,
};
use crate::domain::site::cutoff::cutoff_index_by;
use crate::domain::site::adapter::classify_probe;
use crate::domain::site::{SiteAdapter, SiteError};
use crate::infrastructure::sites::client::{endpoint, infer_rated, SiteClient};
use crate::utils::url_utils::absolutize;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const SITE: &str = "leetcode";
pub const DEFAULT_ORIGIN: &str = "https://leetcode.com";

const PROFILE_QUERY: &str = "query userProfile($username: String!) { \
    matchedUser(username: $username) { username profile { realName school } } }";

const RECENT_SUBMISSIONS_QUERY: &str = "query recentSubmissions($username: String!) { \
    recentSubmissionList(username: $username, limit: 20) { title titleSlug timestamp statusDisplay } }";

const UPCOMING_CONTESTS_QUERY: &str = "query upcomingContests { \
    upcomingContests { title startTime duration } }";

const RATING_HISTORY_QUERY: &str = "query userContestRankingHistory($username: String!) { \
    userContestRankingHistory(username: $username) { attended rating contest { title startTime } } }";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUserData {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct MatchedUser {
    username: String,
    #[serde(default)]
    profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserProfile {
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    school: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentSubmissionsData {
    recent_submission_list: Option<Vec<LeetCodeSubmission>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeSubmission {
    title: String,
    title_slug: String,
    timestamp: String,
    status_display: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingContestsData {
    upcoming_contests: Vec<LeetCodeContest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeContest {
    title: String,
    start_time: i64,
    duration: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingHistoryData {
    #[serde(default)]
    user_contest_ranking_history: Option<Vec<RankingEntry>>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
    attended: bool,
    rating: f64,
    contest: RankingContest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankingContest {
    title: String,
    start_time: i64,
}

/// LeetCode 适配器
///
/// 所有数据都通过 `POST /graphql` 获取
pub struct LeetCodeAdapter {
    client: Arc<SiteClient>,
    origin: Url,
    handle: String,
    ctx: CancellationToken,
}

impl LeetCodeAdapter {
    pub fn new(client: Arc<SiteClient>, origin: Url, handle: String, ctx: CancellationToken) -> Self {
        Self {
            client,
            origin,
            handle,
            ctx,
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, with_username: bool) -> Result<T, SiteError> {
        let url = endpoint(SITE, &self.origin, &["graphql"], &[])?;
        let request = GraphQlRequest {
            query,
            variables: Variables {
                username: with_username.then_some(self.handle.as_str()),
            },
        };
        let response = self
            .client
            .post_json(SITE, url, &request, &self.ctx)
            .await?
            .ensure_success(SITE)?;
        let envelope: GraphQlResponse<T> = response.json(SITE)?;

        match envelope.data {
            Some(data) => Ok(data),
            None => {
                let message = envelope
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                if message.is_empty() {
                    Err(SiteError::parse(SITE, "missing field `data`", &response.body))
                } else {
                    Err(SiteError::transport(SITE, format!("graphql error: {}", message)))
                }
            }
        }
    }

    async fn matched_user(&self) -> Result<MatchedUser, SiteError> {
        let data: MatchedUserData = self.query(PROFILE_QUERY, true).await?;
        data.matched_user
            .ok_or_else(|| SiteError::not_found(SITE, &self.handle))
    }

    fn to_submission(&self, raw: LeetCodeSubmission, created_at: DateTime<Utc>) -> Result<Submission, SiteError> {
        let path = format!("/problems/{}/", raw.title_slug);
        let url = absolutize(&self.origin, &path)
            .map_err(|e| SiteError::parse(SITE, format!("invalid problem url: {}", e), &path))?;
        Ok(Submission {
            contest: "LeetCode".to_string(),
            problem: raw.title,
            url,
            status: raw.status_display,
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
impl SiteAdapter for LeetCodeAdapter {
    fn site(&self) -> &'static str {
        SITE
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    async fn check_handle(&self) -> Result<bool, SiteError> {
        classify_probe(self.matched_user().await.map(|_| ()))
    }

    async fn fetch_profile(&self) -> Result<ProfileInfo, SiteError> {
        let user = self.matched_user().await?;
        let profile = user.profile.unwrap_or(UserProfile {
            real_name: None,
            school: None,
        });
        Ok(ProfileInfo {
            name: profile.real_name.unwrap_or_default(),
            username: user.username,
            school: profile.school.unwrap_or_default(),
        })
    }

    async fn fetch_submissions(&self, after: SyncCutoff) -> Result<Vec<Submission>, SiteError> {
        let data: RecentSubmissionsData = self.query(RECENT_SUBMISSIONS_QUERY, true).await?;
        let raw = data
            .recent_submission_list
            .ok_or_else(|| SiteError::not_found(SITE, &self.handle))?;

        // 时间戳以字符串形式返回
        let mut timed = raw
            .into_iter()
            .map(|s| {
                let seconds = s.timestamp.trim().parse::<i64>().map_err(|_| {
                    SiteError::parse(SITE, format!("invalid timestamp `{}`", s.timestamp), "")
                })?;
                Ok((timestamp(seconds)?, s))
            })
            .collect::<Result<Vec<_>, SiteError>>()?;

        let index = cutoff_index_by(&timed, after, |(created_at, _)| *created_at);
        timed.truncate(index);
        timed
            .into_iter()
            .map(|(created_at, s)| self.to_submission(s, created_at))
            .collect()
    }

    async fn fetch_contests(&self) -> Result<Vec<Contest>, SiteError> {
        let data: UpcomingContestsData = self.query(UPCOMING_CONTESTS_QUERY, false).await?;
        data.upcoming_contests
            .into_iter()
            .map(|c| {
                let end = c.start_time.checked_add(c.duration).ok_or_else(|| {
                    SiteError::parse(SITE, format!("contest end overflows for `{}`", c.title), "")
                })?;
                Ok(Contest {
                    rated: infer_rated(&c.title),
                    name: c.title,
                    start_epoch: c.start_time,
                    end_epoch: end,
                    archived: false,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()
    }

    async fn fetch_rating_history(&self) -> Result<Vec<RatingPoint>, SiteError> {
        let data: RatingHistoryData = self.query(RATING_HISTORY_QUERY, true).await?;

        let mut points = data
            .user_contest_ranking_history
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.attended)
            .map(|entry| {
                Ok(RatingPoint {
                    contest_name: entry.contest.title,
                    date: timestamp(entry.contest.start_time)?
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    rating: entry.rating,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()?;
        sort_rating_history(&mut points);
        Ok(points)
    }
}
