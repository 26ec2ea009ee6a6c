// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 通过配置构建的注册表对 wiremock 源站做端到端的增量性质检查

use chrono::{DateTime, Duration, TimeZone, Utc};
use profile_sync::config::settings::{SiteSettings, SitesSettings};
use profile_sync::domain::models::sync_job::JobAction;
use profile_sync::domain::services::sync_engine::SyncEngine;
use profile_sync::infrastructure::sites::{AdapterRegistry, SiteClient};
use profile_sync::utils::url_utils::is_absolute;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn hackerrank_server() -> MockServer {
    let server = MockServer::start().await;
    let models: Vec<_> = (0..5)
        .rev()
        .map(|i| {
            json!({
                "name": format!("Problem {}", i),
                "ch_slug": format!("p{}", i),
                "con_slug": "master",
                "url": format!("/challenges/p{}", i),
                "created_at": (t0() + Duration::minutes(i)).to_rfc3339()
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/rest/hackers/alice/recent_challenges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/contests/master/hackers/alice/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": {"username": "alice", "name": "Alice", "school": "MIT"}
        })))
        .mount(&server)
        .await;
    server
}

fn engine_for(server: &MockServer) -> SyncEngine {
    let mut sites = SitesSettings::default();
    sites.hackerrank = SiteSettings::enabled(&server.uri());
    for disabled in [
        &mut sites.codeforces,
        &mut sites.codechef,
        &mut sites.spoj,
        &mut sites.leetcode,
    ] {
        disabled.enabled = false;
    }
    let client = Arc::new(SiteClient::new(sites.request_timeout(), &sites.user_agent));
    let registry = AdapterRegistry::from_settings(&sites, client).unwrap();
    assert_eq!(registry.sites(), vec!["hackerrank"]);
    SyncEngine::new(Arc::new(registry))
}

#[tokio::test]
async fn test_later_cutoff_yields_prefix_of_earlier_cutoff() {
    let server = hackerrank_server().await;
    let engine = engine_for(&server);
    let user = Uuid::new_v4();

    let mut previous: Option<Vec<String>> = None;
    for minutes in [-1, 0, 2, 4] {
        let cutoff = Some(t0() + Duration::minutes(minutes));
        let result = engine
            .sync(user, "hackerrank", "alice", cutoff, JobAction::RefreshSubmissions, CancellationToken::new())
            .await
            .unwrap();
        assert!(result.submissions.iter().all(|s| Some(s.created_at) > cutoff));

        let urls: Vec<String> = result.submissions.into_iter().map(|s| s.url).collect();
        if let Some(earlier) = &previous {
            assert!(earlier.starts_with(&urls));
        }
        previous = Some(urls);
    }
    assert_eq!(previous.map(|p| p.len()), Some(0));
}

#[tokio::test]
async fn test_sync_from_new_cutoff_is_idempotent() {
    let server = hackerrank_server().await;
    let engine = engine_for(&server);
    let user = Uuid::new_v4();

    let first = engine
        .sync(user, "hackerrank", "alice", None, JobAction::RefreshSubmissions, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.submissions.len(), 5);
    assert_eq!(first.new_cutoff, Some(t0() + Duration::minutes(4)));
    assert!(first
        .submissions
        .iter()
        .all(|s| is_absolute(&s.url) && s.url.starts_with(&server.uri())));

    for _ in 0..2 {
        let again = engine
            .sync(user, "hackerrank", "alice", first.new_cutoff, JobAction::RefreshSubmissions, CancellationToken::new())
            .await
            .unwrap();
        assert!(again.submissions.is_empty());
        assert_eq!(again.new_cutoff, first.new_cutoff);
        assert_eq!(again.profile, first.profile);
    }
}
