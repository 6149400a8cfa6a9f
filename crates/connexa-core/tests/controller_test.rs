// Integration tests for `Controller` against a wiremock panel.

#![allow(clippy::unwrap_used)]

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::broadcast;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use connexa_api::{ApiClient, FileTokenStore, MemoryTokenStore, SessionStore, TokenPersistence};
use connexa_core::{
    AddWhitelistEntry, AssumeYes, Command, CommandResult, Controller, ControllerConfig, CoreError,
    Level, LoadOutcome, NavEvent, NavState, Notification, Resource, ScalePool, Tab, TotpCode,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn controller_for(server: &MockServer, session: SessionStore) -> Controller {
    let mut config = ControllerConfig::new(Url::parse(&server.uri()).unwrap());
    // Keep the poller out of the way; it has its own unit tests.
    config.poll_interval = Duration::from_secs(3600);
    let api =
        ApiClient::with_client(&server.uri(), reqwest::Client::new(), Arc::new(session)).unwrap();
    Controller::with_api(config, api)
}

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    let controller = controller_for(&server, SessionStore::in_memory());
    (server, controller)
}

/// Panel with a persisted token, already restored into the dashboard.
async fn setup_dashboard() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    mount_me(&server, false).await;
    mount_dashboard(&server).await;

    let session = SessionStore::new(Arc::new(MemoryTokenStore::with_token("tok-1")));
    let controller = controller_for(&server, session);
    let state = controller.restore().await.unwrap();
    assert!(state.is_dashboard());
    (server, controller)
}

async fn mount_me(server: &MockServer, require_password_change: bool) {
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "admin",
            "is_admin": true,
            "totp_enabled": false,
            "require_password_change": require_password_change,
        })))
        .mount(server)
        .await;
}

fn stats_body() -> serde_json::Value {
    json!({
        "total_nodes": 2,
        "healthy_nodes": 1,
        "unhealthy_nodes": 1,
        "health_percentage": 50.0,
        "countries": { "DE": 1, "US": 1 },
    })
}

fn nodes_body() -> serde_json::Value {
    json!({
        "total": 2,
        "nodes": [
            { "node_id": "tor-0", "socks_port": 9050, "control_port": 9051,
              "exit_ip": "185.220.101.4", "exit_country": "de", "status": "healthy",
              "latency_ms": 120.0 },
            { "node_id": "tor-1", "socks_port": 9052, "control_port": 9053,
              "exit_ip": null, "exit_country": null, "status": "down", "latency_ms": null },
        ],
    })
}

fn tokens_body(revoked: bool) -> serde_json::Value {
    json!({
        "tokens": [
            { "id": 7, "description": "grafana", "expires_at": "2099-01-01T00:00:00",
              "is_revoked": revoked, "use_count": 3 },
        ],
    })
}

async fn mount_dashboard(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/stats/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tor_pool_size": 2,
            "tor_base_socks_port": 9050,
            "tor_countries": ["DE", "US"],
            "firewall_backend": "nftables",
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(false)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_restore_without_token_stays_logged_out() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = controller.restore().await.unwrap();
    assert_eq!(state, NavState::LoggedOut);
    assert!(!controller.is_polling());
}

#[tokio::test]
async fn test_restore_with_rejected_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token" })),
        )
        .mount(&server)
        .await;

    let session = SessionStore::new(Arc::new(MemoryTokenStore::with_token("stale")));
    let controller = controller_for(&server, session);

    let err = controller.restore().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!controller.session().is_authenticated());
    assert_eq!(controller.navigation(), NavState::LoggedOut);
}

#[tokio::test]
async fn test_login_enters_dashboard_and_loads_all_panels() {
    let (server, controller) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-9",
            "token_type": "bearer",
            "require_password_change": false,
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, false).await;
    mount_dashboard(&server).await;

    let state = controller
        .login("admin", &SecretString::from("hunter2".to_owned()), None)
        .await
        .unwrap();

    assert!(state.is_nodes_view_active());
    assert!(controller.is_polling());
    assert_eq!(controller.current_user().unwrap().username, "admin");

    let store = controller.store();
    assert_eq!(store.stats.data().unwrap().total_nodes, 2);
    assert_eq!(store.nodes.data().unwrap().len(), 2);
    assert_eq!(store.config.data().unwrap().pool_size, 2);
    assert_eq!(store.tokens.data().unwrap().len(), 1);
    assert!(store.last_full_refresh().is_some());
}

#[tokio::test]
async fn test_login_with_forced_password_change_skips_dashboard() {
    let (server, controller) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-9",
            "require_password_change": true,
        })))
        .mount(&server)
        .await;
    mount_me(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body()))
        .expect(0)
        .mount(&server)
        .await;

    let state = controller
        .login("admin", &SecretString::from("admin".to_owned()), None)
        .await
        .unwrap();

    assert_eq!(state, NavState::PasswordChangeRequired);
    assert!(!controller.is_polling());
}

#[tokio::test]
async fn test_login_asks_for_second_factor() {
    let (server, controller) = setup().await;
    let mut notices = controller.notifications();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "2FA token required" })),
        )
        .mount(&server)
        .await;

    let err = controller
        .login("admin", &SecretString::from("hunter2".to_owned()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::TwoFactorRequired));
    assert_eq!(controller.navigation(), NavState::LoggedOut);
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let (_server, controller) = setup_dashboard().await;

    controller.logout().await;

    assert_eq!(controller.navigation(), NavState::LoggedOut);
    assert!(!controller.session().is_authenticated());
    assert!(!controller.is_polling());
    assert!(controller.current_user().is_none());
    assert!(controller.store().nodes.data().is_none());
    assert!(controller.store().last_full_refresh().is_none());
}

#[tokio::test]
async fn test_failed_user_fetch_after_login_drops_the_token() {
    let server = MockServer::start().await;
    let backend = Arc::new(MemoryTokenStore::new());
    let controller = controller_for(&server, SessionStore::new(backend.clone()));

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-9",
            "require_password_change": false,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "db down" })))
        .mount(&server)
        .await;

    let err = controller
        .login("admin", &SecretString::from("hunter2".to_owned()), None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(controller.navigation(), NavState::LoggedOut);
    assert!(!controller.session().is_authenticated());
    assert!(backend.load().unwrap().is_none());
    assert!(controller.current_user().is_none());
}

#[tokio::test]
async fn test_whoami_error_response_forces_logout() {
    let (server, controller) = setup_dashboard().await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = controller.whoami().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(controller.navigation(), NavState::LoggedOut);
    assert!(!controller.session().is_authenticated());
    assert!(!controller.is_polling());
}

#[tokio::test]
async fn test_session_survives_a_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("sessions").join("default.token");

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-file",
            "require_password_change": false,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer tok-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "admin",
            "require_password_change": false,
        })))
        .expect(2)
        .mount(&server)
        .await;
    mount_dashboard(&server).await;

    let first = controller_for(
        &server,
        SessionStore::new(Arc::new(FileTokenStore::new(&token_path))),
    );
    first
        .login("admin", &SecretString::from("hunter2".to_owned()), None)
        .await
        .unwrap();
    first.shutdown();
    drop(first);

    let second = controller_for(
        &server,
        SessionStore::new(Arc::new(FileTokenStore::new(&token_path))),
    );
    let state = second.restore().await.unwrap();

    assert!(state.is_dashboard());
    assert_eq!(second.current_user().unwrap().username, "admin");

    second.logout().await;
    assert!(!token_path.exists());
}

// ── Dashboard loads ─────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_all_applies_partial_results() {
    let (server, controller) = setup_dashboard().await;
    let mut notices = controller.notifications();
    assert_eq!(controller.store().nodes.data().unwrap().len(), 2);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/stats/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Tor control port down" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tor_pool_size": 3 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(true)))
        .mount(&server)
        .await;

    let report = controller.refresh_all().await;

    assert!(!report.is_complete());
    assert_eq!(report.succeeded().count(), 3);
    assert_eq!(
        report.outcome(Resource::Nodes),
        Some(&LoadOutcome::Failed("Tor control port down".into()))
    );

    let store = controller.store();
    assert_eq!(store.config.data().unwrap().pool_size, 3);
    assert!(store.tokens.data().unwrap()[0].is_revoked);

    // The failed panel keeps what it showed before, plus the error.
    let nodes = store.nodes.data().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].node_id, "tor-0");
    assert_eq!(store.nodes.error().as_deref(), Some("Tor control port down"));

    let errors: Vec<_> = drain(&mut notices)
        .into_iter()
        .filter(|n| n.level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Tor control port down"));
    assert!(controller.session().is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_load_forces_logout_once() {
    let server = MockServer::start().await;
    mount_me(&server, false).await;
    for p in [
        "/api/v1/nodes/stats/summary",
        "/api/v1/nodes/",
        "/api/v1/config/",
        "/api/v1/export/tokens",
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
            .mount(&server)
            .await;
    }

    let session = SessionStore::new(Arc::new(MemoryTokenStore::with_token("tok-1")));
    let controller = controller_for(&server, session);
    let mut notices = controller.notifications();

    controller.restore().await.unwrap();

    assert_eq!(controller.navigation(), NavState::LoggedOut);
    assert!(!controller.session().is_authenticated());
    assert!(!controller.is_polling());

    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Session expired"));
}

#[tokio::test]
async fn test_load_from_previous_session_is_discarded() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config/whitelist"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "whitelist": ["10.0.0.1"] }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.load(Resource::Whitelist).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.session().clear();

    assert_eq!(pending.await.unwrap(), LoadOutcome::Discarded);
    assert!(controller.store().whitelist.data().is_none());
}

#[tokio::test]
async fn test_unauthorized_answer_from_previous_session_keeps_new_login() {
    let (server, controller) = setup_dashboard().await;
    let mut notices = controller.notifications();

    Mock::given(method("GET"))
        .and(path("/api/v1/config/whitelist"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "expired" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.load(Resource::Whitelist).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.logout().await;
    controller
        .session()
        .set_token(SecretString::from("tok-new".to_owned()));

    assert_eq!(pending.await.unwrap(), LoadOutcome::Discarded);
    let current = controller.session().current().unwrap();
    assert_eq!(secrecy::ExposeSecret::expose_secret(&current), "tok-new");
    assert!(
        drain(&mut notices)
            .iter()
            .all(|n| !n.message.contains("Session expired"))
    );
}

#[tokio::test]
async fn test_tab_selection_loads_its_resource() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [
                { "event_type": "login", "severity": "info", "username": "admin",
                  "message": "Login succeeded", "created_at": "2026-10-01T12:00:00Z" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    controller.navigate(NavEvent::SelectTab(Tab::Logs)).await;

    assert_eq!(controller.navigation().tab(), Some(Tab::Logs));
    assert!(!controller.navigation().is_nodes_view_active());
    assert_eq!(controller.store().logs.data().unwrap().len(), 1);
}

#[tokio::test]
async fn test_node_detail_fetch() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/nodes/tor-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node_id": "tor-0", "socks_port": 9050, "control_port": 9051,
            "exit_ip": "185.220.101.4", "exit_country": "de", "status": "healthy",
            "latency_ms": 640.0,
        })))
        .mount(&server)
        .await;

    let node = controller.node("tor-0").await.unwrap();
    assert_eq!(node.exit_country.as_deref(), Some("DE"));
    assert_eq!(node.health(), connexa_core::HealthState::Slow);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_input_never_reaches_the_network() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        ScalePool::parse("0"),
        Err(CoreError::Validation { .. })
    ));
    assert!(matches!(
        ScalePool::parse("4.5"),
        Err(CoreError::Validation { .. })
    ));

    let err = controller
        .execute(
            Command::RotateNode {
                node_id: " ".into(),
            },
            &AssumeYes,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn test_scale_refreshes_the_whole_dashboard() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/nodes/scale"))
        .and(wiremock::matchers::query_param("new_size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Scaling" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(false)))
        .mount(&server)
        .await;

    let before = controller.store().last_full_refresh().unwrap();
    let result = controller
        .execute(Command::ScalePool(ScalePool::parse("5").unwrap()), &AssumeYes)
        .await
        .unwrap();

    assert!(matches!(result, CommandResult::Ok { message: Some(ref m) } if m == "Scaling"));
    assert!(controller.store().last_full_refresh().unwrap() >= before);
}

#[tokio::test]
async fn test_revoke_round_trip() {
    let (server, controller) = setup_dashboard().await;
    assert!(controller.store().tokens.data().unwrap()[0].is_active());

    Mock::given(method("DELETE"))
        .and(path("/api/v1/export/tokens/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token revoked" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(true)))
        .mount(&server)
        .await;

    let result = controller
        .execute(Command::RevokeExportToken { id: 7 }, &AssumeYes)
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Ok { .. }));

    let tokens = controller.store().tokens.data().unwrap();
    assert!(tokens[0].is_revoked);
    assert!(!tokens[0].is_active());
}

#[tokio::test]
async fn test_revoking_twice_is_harmless() {
    let (server, controller) = setup_dashboard().await;
    let mut notices = controller.notifications();

    Mock::given(method("DELETE"))
        .and(path("/api/v1/export/tokens/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "Token revoked successfully" })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(true)))
        .mount(&server)
        .await;

    for _ in 0..2 {
        controller
            .execute(Command::RevokeExportToken { id: 7 }, &AssumeYes)
            .await
            .unwrap();
    }

    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == Level::Success));
    assert!(controller.store().tokens.error().is_none());
    assert!(controller.store().tokens.data().unwrap()[0].is_revoked);
}

#[tokio::test]
async fn test_declined_confirmation_sends_nothing() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/config/whitelist/10.0.0.1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let decline = |_: &str| false;
    let result = controller
        .execute(
            Command::RemoveWhitelistEntry {
                ip: IpAddr::from([10, 0, 0, 1]),
            },
            &decline,
        )
        .await
        .unwrap();

    assert!(matches!(result, CommandResult::Cancelled));
}

#[tokio::test]
async fn test_whitelist_add_and_remove_round_trip() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/config/whitelist"))
        .and(body_json(json!({ "ip": "10.0.0.1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Added" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/config/whitelist"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "whitelist": ["10.0.0.1", "not-an-ip"] })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    controller
        .execute(
            Command::AddWhitelistEntry(AddWhitelistEntry::parse("10.0.0.1").unwrap()),
            &AssumeYes,
        )
        .await
        .unwrap();

    let ip: IpAddr = "10.0.0.1".parse().unwrap();
    let whitelist = controller.store().whitelist.data().unwrap();
    assert_eq!(whitelist.len(), 1);
    assert!(whitelist.contains(&ip));

    Mock::given(method("DELETE"))
        .and(path("/api/v1/config/whitelist/10.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Removed" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/config/whitelist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "whitelist": [] })))
        .mount(&server)
        .await;

    let confirmed = |prompt: &str| prompt.contains("10.0.0.1");
    controller
        .execute(Command::RemoveWhitelistEntry { ip }, &confirmed)
        .await
        .unwrap();

    assert!(controller.store().whitelist.data().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_command_notifies_once_and_returns_error() {
    let (server, controller) = setup_dashboard().await;
    let mut notices = controller.notifications();

    Mock::given(method("POST"))
        .and(path("/api/v1/config/firewall/apply"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "nft not installed" })),
        )
        .mount(&server)
        .await;

    let err = controller
        .execute(Command::ApplyFirewall, &AssumeYes)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "nft not installed");
    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Error);
}

#[tokio::test]
async fn test_create_token_returns_secret_once() {
    let (server, controller) = setup_dashboard().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/export/tokens"))
        .and(body_json(json!({ "description": "grafana" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "cx_secret",
            "expires_at": "2099-01-01T00:00:00",
            "description": "grafana",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/export/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_body(false)))
        .mount(&server)
        .await;

    let result = controller
        .execute(
            Command::CreateExportToken(connexa_core::CreateExportToken::new(Some("grafana"))),
            &AssumeYes,
        )
        .await
        .unwrap();

    let CommandResult::TokenCreated(created) = result else {
        panic!("expected a created token");
    };
    assert_eq!(
        secrecy::ExposeSecret::expose_secret(&created.token),
        "cx_secret"
    );
}

// ── Account ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_factor_enrollment_marks_user() {
    let (server, controller) = setup_dashboard().await;
    assert!(!controller.current_user().unwrap().totp_enabled);

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/setup-2fa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret": "JBSWY3DPEHPK3PXP",
            "uri": "otpauth://totp/Connexa:admin?secret=JBSWY3DPEHPK3PXP",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/verify-2fa"))
        .and(query_param("totp_token", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "2FA enabled successfully" })))
        .expect(1)
        .mount(&server)
        .await;

    let enrollment = controller.setup_two_factor().await.unwrap();
    assert_eq!(
        secrecy::ExposeSecret::expose_secret(&enrollment.secret),
        "JBSWY3DPEHPK3PXP"
    );

    controller
        .execute(
            Command::EnableTwoFactor(TotpCode::parse("123 456").unwrap()),
            &AssumeYes,
        )
        .await
        .unwrap();
    assert!(controller.current_user().unwrap().totp_enabled);
}

#[tokio::test]
async fn test_rejected_two_factor_code_keeps_session() {
    let (server, controller) = setup_dashboard().await;
    let mut notices = controller.notifications();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/verify-2fa"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Invalid TOTP token" })),
        )
        .mount(&server)
        .await;

    let err = controller
        .execute(
            Command::EnableTwoFactor(TotpCode::parse("000000").unwrap()),
            &AssumeYes,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid TOTP token");
    assert!(controller.navigation().is_dashboard());
    assert!(!controller.current_user().unwrap().totp_enabled);
    assert_eq!(drain(&mut notices).len(), 1);
}

#[tokio::test]
async fn test_metrics_summary_leaves_panels_alone() {
    let (server, controller) = setup_dashboard().await;
    let stats_before = controller.store().stats.snapshot().updated_at;

    Mock::given(method("GET"))
        .and(path("/api/v1/metrics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": { "total": 2, "healthy": 1, "unhealthy": 1, "health_percentage": 50.0 },
        })))
        .mount(&server)
        .await;

    let metrics = controller.metrics().await.unwrap();
    assert_eq!(metrics.total, 2);
    assert_eq!(metrics.unhealthy, 1);
    assert_eq!(controller.store().stats.snapshot().updated_at, stats_before);
}
