// Integration tests for `ApiClient` using wiremock.

#![allow(clippy::unwrap_used)]

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use connexa_api::{ApiClient, Error, MemoryTokenStore, SessionStore};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let session = Arc::new(SessionStore::in_memory());
    let client = ApiClient::with_client(&server.uri(), reqwest::Client::new(), session).unwrap();
    (server, client)
}

async fn setup_authenticated(token: &str) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStore::with_token(
        token,
    ))));
    session.restore();
    let client = ApiClient::with_client(&server.uri(), reqwest::Client::new(), session).unwrap();
    (server, client)
}

// ── Gateway behaviour ───────────────────────────────────────────────

#[tokio::test]
async fn test_request_sends_bearer_and_json_content_type() {
    let (server, client) = setup_authenticated("tok-1").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "nodes": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let nodes = client.list_nodes().await.unwrap();
    assert!(nodes.is_empty());
}

#[tokio::test]
async fn test_request_without_session_goes_out_unauthenticated() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tor_pool_size": 3 })))
        .mount(&server)
        .await;

    let config = client.get_config().await.unwrap();
    assert_eq!(config.tor_pool_size, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_error_detail_is_surfaced_verbatim() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/nodes/tor-9/rotate"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Node tor-9 not found" })),
        )
        .mount(&server)
        .await;

    let err = client.rotate_node("tor-9").await.unwrap_err();
    match err {
        Error::Request { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Node tor-9 not found");
        }
        other => panic!("expected Request error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_error_body_uses_fallback_message() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/config/firewall/apply"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client.apply_firewall().await.unwrap_err();
    assert!(
        matches!(err, Error::Request { status: 500, ref message } if message == "Request failed"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unparsable_success_body_is_empty_object() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/nodes/rotate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let value = client
        .request(Method::POST, "nodes/rotate", None, None)
        .await
        .unwrap();
    assert_eq!(value, json!({}));

    let ack = client.rotate_all_nodes().await.unwrap();
    assert!(ack.message.is_none());
}

#[tokio::test]
async fn test_401_clears_session() {
    let (server, client) = setup_authenticated("stale").await;
    assert!(client.session().is_authenticated());

    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/stats/summary"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Could not validate credentials" })),
        )
        .mount(&server)
        .await;

    let err = client.node_stats().await.unwrap_err();
    assert!(err.is_auth_expired());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_401_for_previous_session_keeps_the_new_one() {
    let (server, client) = setup_authenticated("old").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/stats/summary"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Could not validate credentials" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.node_stats().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.session().set_token(SecretString::from("new".to_owned()));

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::StaleSession), "got {err:?}");
    assert!(!err.is_auth_expired());
    assert_eq!(
        client.session().current().unwrap().expose_secret(),
        "new"
    );
}

#[tokio::test]
async fn test_shape_mismatch_is_deserialization_error() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokens": "nope" })))
        .mount(&server)
        .await;

    let err = client.list_export_tokens().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "bearer",
            "require_password_change": true
        })))
        .mount(&server)
        .await;

    let outcome = client
        .login("admin", &SecretString::from("pw".to_owned()), None)
        .await
        .unwrap();

    assert!(outcome.require_password_change);
    assert_eq!(
        client.session().current().as_ref().map(|t| t.expose_secret()),
        Some("fresh")
    );
}

#[tokio::test]
async fn test_login_two_factor_prompt() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "2FA token required" })),
        )
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("pw".to_owned()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TwoFactorRequired), "got {err:?}");
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_login_bad_credentials_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect username or password" })),
        )
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("bad".to_owned()), None)
        .await
        .unwrap_err();
    match err {
        Error::Authentication { message } => {
            assert_eq!(message, "Incorrect username or password");
        }
        other => panic!("expected Authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_rejected_totp_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({
            "username": "admin",
            "password": "pw",
            "totp_token": "000000"
        })))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid 2FA token" })),
        )
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("pw".to_owned()), Some("000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
}

// ── Resources ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_scale_sends_query_parameter() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/nodes/scale"))
        .and(query_param("new_size", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Pool scaled to 12 nodes",
            "new_size": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.scale_pool(12).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Pool scaled to 12 nodes"));
}

#[tokio::test]
async fn test_countries_are_comma_joined() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/config/tor/countries"))
        .and(body_json(json!({ "countries": "DE,US", "strict_nodes": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_countries(&["DE", "US"], true).await.unwrap();
}

#[tokio::test]
async fn test_whitelist_add_and_remove_paths() {
    let (server, client) = setup_authenticated("tok").await;
    let ip: IpAddr = "203.0.113.7".parse().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/config/whitelist"))
        .and(body_json(json!({ "ip": "203.0.113.7" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "added" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/config/whitelist/203.0.113.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "removed" })))
        .expect(1)
        .mount(&server)
        .await;

    client.add_whitelist_entry(ip).await.unwrap();
    client.remove_whitelist_entry(ip).await.unwrap();
}

#[tokio::test]
async fn test_export_token_lifecycle() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/export/tokens"))
        .and(body_json(json!({ "description": "grafana" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "raw-secret",
            "expires_at": "2025-12-31T23:59:59",
            "description": "grafana"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/export/tokens/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token revoked" })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_export_token(Some("grafana")).await.unwrap();
    assert_eq!(created.token, "raw-secret");
    assert_eq!(created.description.as_deref(), Some("grafana"));

    let ack = client.revoke_export_token(7).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Token revoked"));
}

#[tokio::test]
async fn test_logs_limit_query() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/logs"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [{
                "event_type": "login_success",
                "severity": "info",
                "username": "admin",
                "message": "Login successful",
                "created_at": "2025-01-02T03:04:05"
            }]
        })))
        .mount(&server)
        .await;

    let logs = client.list_logs(50).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].event_type, "login_success");
    assert_eq!(logs[0].username.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_two_factor_enrollment() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/setup-2fa"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret": "JBSWY3DPEHPK3PXP",
            "qr_code": "data:image/png;base64,AAAA",
            "uri": "otpauth://totp/Connexa:admin?secret=JBSWY3DPEHPK3PXP&issuer=Connexa",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/verify-2fa"))
        .and(query_param("totp_token", "123456"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "2FA enabled successfully" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let setup = client.setup_two_factor().await.unwrap();
    assert_eq!(setup.secret, "JBSWY3DPEHPK3PXP");
    assert!(setup.uri.starts_with("otpauth://totp/"));

    let ack = client.verify_two_factor("123456").await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("2FA enabled successfully"));
}

#[tokio::test]
async fn test_two_factor_verify_rejection_keeps_session() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/verify-2fa"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Invalid TOTP token" })),
        )
        .mount(&server)
        .await;

    let err = client.verify_two_factor("000000").await.unwrap_err();
    assert!(
        matches!(err, Error::Request { status: 400, ref message } if message == "Invalid TOTP token")
    );
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_metrics_summary() {
    let (server, client) = setup_authenticated("tok").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/metrics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": { "total": 4, "healthy": 3, "unhealthy": 1, "health_percentage": 75.0 },
        })))
        .mount(&server)
        .await;

    let metrics = client.metrics().await.unwrap();
    assert_eq!(metrics.nodes.total, 4);
    assert_eq!(metrics.nodes.unhealthy, 1);
    assert!((metrics.nodes.health_percentage - 75.0).abs() < f64::EPSILON);
}
