// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::mock_origin;
use chrono::{TimeZone, Utc};
use profile_sync::domain::site::SiteAdapter;
use profile_sync::infrastructure::sites::codechef::CodeChefAdapter;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROFILE_PAGE: &str = r#"<html><body>
<div class="user-details-container">
  <header><h1 class="h2-style">Chef   Master</h1></header>
  <section class="user-details"><ul>
    <li><label>Country:</label><span>India</span></li>
    <li><label>Institution:</label><span>IIT Bombay</span></li>
  </ul></section>
</div>
<script>var all_rating = [
  {"name":"Starters 120","end_date":"2024-02-07 22:00:00","rating":"1702"},
  {"name":"Starters 100","end_date":"2023-09-13 22:00:00","rating":"1650"}
];</script>
</body></html>"#;

fn adapter(server: &MockServer, handle: &str) -> CodeChefAdapter {
    let (client, origin) = mock_origin(server);
    CodeChefAdapter::new(client, origin, handle.to_string(), CancellationToken::new())
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/chef"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_profile_page_yields_name_school_and_rating() {
    let server = MockServer::start().await;
    mount_profile(&server).await;

    let chef = adapter(&server, "chef");
    assert_eq!(chef.check_handle().await, Ok(true));

    let profile = chef.fetch_profile().await.unwrap();
    assert_eq!(profile.name, "Chef Master");
    assert_eq!(profile.username, "chef");
    assert_eq!(profile.school, "IIT Bombay");

    let rating = chef.fetch_rating_history().await.unwrap();
    let names: Vec<_> = rating.iter().map(|p| p.contest_name.as_str()).collect();
    assert_eq!(names, vec!["Starters 100", "Starters 120"]);
    assert_eq!(rating[1].rating, 1702.0);
}

#[tokio::test]
async fn test_missing_user_page_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(adapter(&server, "ghost").check_handle().await, Ok(false));
}

#[tokio::test]
async fn test_redirect_away_from_users_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(&server)
        .await;

    let err = adapter(&server, "ghost").fetch_profile().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_server_error_is_not_reported_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/chef"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = adapter(&server, "chef").check_handle().await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_recent_submissions_sorted_and_cut_off() {
    let server = MockServer::start().await;
    let content = r#"<table><tbody>
        <tr><td><span title="09:00 AM 01/05/24">old</span></td>
            <td><a href="/problems/OLD">OLD</a></td>
            <td><span title="wrong answer"></span></td><td>C++</td></tr>
        <tr><td><span title="11:00 AM 01/05/24">newer</span></td>
            <td><a href="/problems/NEWER">NEWER</a></td>
            <td><span title="accepted"></span></td><td>C++</td></tr>
        <tr><td><span title="10:00 AM 01/05/24">middle</span></td>
            <td><a href="/problems/MIDDLE">MIDDLE</a></td>
            <td><span title="accepted"></span></td><td>Python</td></tr>
        </tbody></table>"#;
    Mock::given(method("GET"))
        .and(path("/recent/user"))
        .and(query_param("user_handle", "chef"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"max_page": 1, "content": content})),
        )
        .mount(&server)
        .await;

    // 09:30 IST
    let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).single();
    let subs = adapter(&server, "chef")
        .fetch_submissions(cutoff)
        .await
        .unwrap();

    let names: Vec<_> = subs.iter().map(|s| s.problem.as_str()).collect();
    assert_eq!(names, vec!["NEWER", "MIDDLE"]);
    assert_eq!(subs[0].url, format!("{}/problems/NEWER", server.uri()));
    assert_eq!(subs[0].created_at, Utc.with_ymd_and_hms(2024, 5, 1, 5, 30, 0).unwrap());
    assert!(subs.iter().all(|s| s.contest == "CodeChef"));
}

#[tokio::test]
async fn test_contests_combine_present_and_future() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/list/contests/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "present_contests": [{
                "contest_name": "Starters 130", "contest_code": "START130",
                "contest_start_date_iso": "2024-05-01T20:00:00+05:30",
                "contest_end_date_iso": "2024-05-01T22:00:00+05:30"
            }],
            "future_contests": [{
                "contest_name": "Unrated Practice Round", "contest_code": "PRAC",
                "contest_start_date_iso": "2024-05-08T20:00:00+05:30",
                "contest_end_date_iso": "2024-05-08T22:00:00+05:30"
            }],
            "past_contests": []
        })))
        .mount(&server)
        .await;

    let contests = adapter(&server, "chef").fetch_contests().await.unwrap();
    assert_eq!(contests.len(), 2);
    assert_eq!(contests[0].name, "Starters 130");
    assert_eq!(contests[0].end_epoch - contests[0].start_epoch, 7200);
    assert!(contests[0].rated);
    assert!(!contests[1].rated);
}
