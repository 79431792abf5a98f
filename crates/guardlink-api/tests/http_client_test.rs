#![allow(clippy::unwrap_used)]
// Integration tests for `HttpClient` using wiremock.

use std::collections::HashMap;

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guardlink_api::{BasicAuth, Error, HttpClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(http_method: &str, auth: Option<BasicAuth>) -> (MockServer, HttpClient, Url) {
    let server = MockServer::start().await;
    let client = HttpClient::with_client(reqwest::Client::new(), http_method, auth).unwrap();
    let url = Url::parse(&format!("{}/panel", server.uri())).unwrap();
    (server, client, url)
}

fn credentials(preemptive: bool) -> BasicAuth {
    BasicAuth {
        username: "admin".into(),
        password: SecretString::from("hunter2".to_string()),
        preemptive,
    }
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_sends_configured_method_and_body() {
    let (server, client, url) = setup("POST", None).await;

    Mock::given(method("POST"))
        .and(path("/panel"))
        .and(body_string("mode=away"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .execute(&url, "mode=away", &HashMap::new())
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "1");
}

#[tokio::test]
async fn test_explicit_headers_are_attached() {
    let (server, client, url) = setup("GET", None).await;

    Mock::given(method("GET"))
        .and(path("/panel"))
        .and(header("X-Panel-Token", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("3"))
        .expect(1)
        .mount(&server)
        .await;

    let headers = HashMap::from([("X-Panel-Token".to_string(), "abc123".to_string())]);
    let resp = client.execute(&url, "", &headers).await.unwrap();

    assert_eq!(resp.body, "3");
}

#[tokio::test]
async fn test_invalid_method_rejected_at_construction() {
    let result = HttpClient::with_client(reqwest::Client::new(), "GE T", None);
    assert!(matches!(result, Err(Error::InvalidMethod(_))));
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_preemptive_basic_auth_on_first_attempt() {
    let (server, client, url) = setup("GET", Some(credentials(true))).await;

    Mock::given(method("GET"))
        .and(path("/panel"))
        .and(basic_auth("admin", "hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0"))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.execute(&url, "", &HashMap::new()).await.unwrap();
    assert_eq!(resp.body, "0");
}

#[tokio::test]
async fn test_challenge_response_when_not_preemptive() {
    let (server, client, url) = setup("GET", Some(credentials(false))).await;

    // Authenticated request succeeds; register first so it takes priority.
    Mock::given(method("GET"))
        .and(path("/panel"))
        .and(basic_auth("admin", "hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2"))
        .expect(1)
        .mount(&server)
        .await;

    // The bare first attempt is met with a challenge.
    Mock::given(method("GET"))
        .and(path("/panel"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"panel\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.execute(&url, "", &HashMap::new()).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "2");
}

#[tokio::test]
async fn test_empty_username_sends_no_auth_header() {
    let auth = BasicAuth {
        username: String::new(),
        password: SecretString::from("ignored".to_string()),
        preemptive: true,
    };
    let (server, client, url) = setup("GET", Some(auth)).await;

    Mock::given(method("GET"))
        .and(path("/panel"))
        .respond_with(ResponseTemplate::new(200).set_body_string("3"))
        .mount(&server)
        .await;

    let resp = client.execute(&url, "", &HashMap::new()).await.unwrap();
    assert_eq!(resp.body, "3");

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| !r.headers.contains_key("authorization")),
        "no Authorization header expected without a username"
    );
}

// ── Status handling ─────────────────────────────────────────────────

#[tokio::test]
async fn test_non_2xx_status_is_not_an_error() {
    let (server, client, url) = setup("GET", None).await;

    Mock::given(method("GET"))
        .and(path("/panel"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let resp = client.execute(&url, "", &HashMap::new()).await.unwrap();

    assert_eq!(resp.status, 503);
    assert!(!resp.is_success());
    assert_eq!(resp.body, "maintenance");
}

#[tokio::test]
async fn test_transport_error_is_surfaced() {
    let client = HttpClient::with_client(reqwest::Client::new(), "GET", None).unwrap();
    // Nothing listens on this port.
    let url = Url::parse("http://127.0.0.1:1/panel").unwrap();

    let result = client.execute(&url, "", &HashMap::new()).await;

    match result {
        Err(Error::Transport(e)) => assert!(e.is_connect(), "expected connect error, got: {e}"),
        other => panic!("expected Transport error, got: {other:?}"),
    }
}
