// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::mock_origin;
use chrono::{TimeZone, Utc};
use profile_sync::domain::site::SiteAdapter;
use profile_sync::infrastructure::sites::spoj::SpojAdapter;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer, handle: &str) -> SpojAdapter {
    let (client, origin) = mock_origin(server);
    SpojAdapter::new(client, origin, handle.to_string(), CancellationToken::new())
}

fn status_row(date: &str, code: &str, result: &str) -> String {
    format!(
        r#"<tr><td class="statusres-id">1</td>
            <td class="status_sm"><span>{date}</span></td>
            <td class="sproblem"><a href="/problems/{code}/">{code}</a></td>
            <td class="statusres">{result}</td></tr>"#
    )
}

#[tokio::test]
async fn test_profile_block_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ranger/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div id="user-profile-left">
                <h3>Lone Ranger</h3><h4>@ranger</h4>
                <p><i class="fa fa-map-marker"></i> Poland, Warsaw</p>
                <p><i class="fa fa-building"></i> Institution: Warsaw University</p>
            </div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let ranger = adapter(&server, "ranger");
    assert_eq!(ranger.check_handle().await, Ok(true));
    let profile = ranger.fetch_profile().await.unwrap();
    assert_eq!(profile.name, "Lone Ranger");
    assert_eq!(profile.username, "ranger");
    assert_eq!(profile.school, "Warsaw University");
}

#[tokio::test]
async fn test_generic_page_for_unknown_user_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><h1>Sphere Online Judge</h1></body></html>"),
        )
        .mount(&server)
        .await;

    assert_eq!(adapter(&server, "ghost").check_handle().await, Ok(false));
    let err = adapter(&server, "ghost").fetch_profile().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_user_page_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(adapter(&server, "ghost").check_handle().await, Ok(false));
    let err = adapter(&server, "ghost").fetch_profile().await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ranger/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = adapter(&server, "ranger").check_handle().await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_status_table_after_cutoff() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<html><body><table class="problems"><tbody>{}{}{}</tbody></table></body></html>"#,
        status_row("2024-05-01 12:00:02", "PRIME1", "accepted"),
        status_row("2024-05-01 12:00:01", "TEST", "wrong answer"),
        status_row("2024-04-30 08:00:00", "ONP", "accepted"),
    );
    Mock::given(method("GET"))
        .and(path("/status/ranger/all/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single();
    let subs = adapter(&server, "ranger")
        .fetch_submissions(cutoff)
        .await
        .unwrap();

    let codes: Vec<_> = subs.iter().map(|s| s.problem.as_str()).collect();
    assert_eq!(codes, vec!["PRIME1", "TEST"]);
    assert_eq!(subs[0].url, format!("{}/problems/PRIME1/", server.uri()));
    assert_eq!(subs[1].status, "wrong answer");
    assert!(subs.iter().all(|s| s.contest == "SPOJ"));
}

#[tokio::test]
async fn test_contest_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contests/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table class="table"><thead><tr><th>Name</th></tr></thead><tbody>
                <tr><td>Weekly Sprint</td><td>2024-05-10 10:00:00</td><td>2024-05-10 12:00:00</td></tr>
            </tbody></table>"#,
        ))
        .mount(&server)
        .await;

    let contests = adapter(&server, "ranger").fetch_contests().await.unwrap();
    assert_eq!(contests.len(), 1);
    assert_eq!(contests[0].name, "Weekly Sprint");
    assert_eq!(contests[0].end_epoch - contests[0].start_epoch, 7200);
}
