//! End-to-end tests for the HTTP surface.
//!
//! Each test drives the full router over a fresh `RocksDB` directory with
//! two declared pools (`pool1`, `pool2`) and one alias (`poolone -> pool1`).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use chrono::Utc;
use serde_json::{json, Value};
use tempfile::TempDir;

use vmpool_auth::MockAuthenticator;
use vmpool_control::{ControlConfig, ControlPlaneService, TokenId};
use vmpool_gateway::{create_router, GatewayConfig, GatewayState, PrometheusMetrics};
use vmpool_store::{Pool, RocksStore, Store, Token, VmRecord, VmState};

/// `admin:s3cr3t`
const ADMIN: &str = "Basic YWRtaW46czNjcjN0";
/// `admin:wrong`
const WRONG_PASSWORD: &str = "Basic YWRtaW46d3Jvbmc=";

const OK_TRUE: &str = "{\n  \"ok\": true\n}";
const OK_FALSE: &str = "{\n  \"ok\": false\n}";

struct Harness {
    server: TestServer,
    store: Arc<RocksStore>,
    metrics: Arc<PrometheusMetrics>,
    _dir: TempDir,
}

fn harness(experimental_features: bool, auth_enabled: bool) -> Harness {
    harness_with_config(experimental_features, auth_enabled, GatewayConfig::default())
}

fn harness_with_config(
    experimental_features: bool,
    auth_enabled: bool,
    config: GatewayConfig,
) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    store
        .declare_pools(
            &[
                Pool {
                    name: "pool1".to_string(),
                    size: 5,
                    template: Some("templates/pool1".to_string()),
                },
                Pool {
                    name: "pool2".to_string(),
                    size: 10,
                    template: None,
                },
            ],
            &BTreeMap::from([("poolone".to_string(), "pool1".to_string())]),
        )
        .unwrap();

    let metrics = Arc::new(PrometheusMetrics::new().unwrap());
    let control = Arc::new(
        ControlPlaneService::new(
            Arc::clone(&store),
            ControlConfig {
                experimental_features,
            },
        )
        .with_metrics(metrics.clone()),
    );
    let state = GatewayState::new(
        control,
        Arc::new(MockAuthenticator::default()),
        auth_enabled,
        config,
    )
    .with_metrics(Arc::clone(&metrics));

    Harness {
        server: TestServer::new(create_router(state)).unwrap(),
        store,
        metrics,
        _dir: dir,
    }
}

fn bad_templates(names: &[&str]) -> String {
    serde_json::to_string_pretty(&json!({ "ok": false, "bad_templates": names })).unwrap()
}

fn seed_token(store: &RocksStore, id: &str, user: &str) -> Token {
    let token = Token {
        id: TokenId::new(id).unwrap(),
        user: user.to_string(),
        created: Utc::now(),
    };
    assert!(store.insert_token(&token).unwrap());
    token
}

fn assert_body(response: &TestResponse, status: StatusCode, body: &str) {
    assert_eq!(response.status_code(), status);
    assert_eq!(response.text(), body);
}

async fn pool(server: &TestServer, name: &str) -> Value {
    let config: Value = server.get("/api/v1/config").await.json();
    config["pool_configuration"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .cloned()
        .unwrap()
}

// =============================================================================
// GET /config
// =============================================================================

#[tokio::test]
async fn config_returns_declared_pools() {
    let h = harness(true, false);

    let response = h.server.get("/api/v1/config").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header(CONTENT_TYPE), "application/json");

    let body: Value = response.json();
    assert_eq!(
        body["pool_configuration"],
        json!([
            {"name": "pool1", "size": 5, "template": "templates/pool1"},
            {"name": "pool2", "size": 10}
        ])
    );
}

// =============================================================================
// POST /config/pooltemplate
// =============================================================================

#[tokio::test]
async fn updates_a_pool_template() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"templates/new_template"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);

    assert_eq!(
        pool(&h.server, "pool1").await["template"],
        "templates/new_template"
    );
}

#[tokio::test]
async fn updates_multiple_pool_templates() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"templates/new_template","pool2":"templates/new_template2"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);

    assert_eq!(pool(&h.server, "pool2").await["template"], "templates/new_template2");
}

#[tokio::test]
async fn unchanged_template_returns_200() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"templates/pool1"}"#)
        .await;
    assert_body(&response, StatusCode::OK, OK_TRUE);
}

#[tokio::test]
async fn repeating_a_change_returns_201_then_200() {
    let h = harness(true, false);
    let body = r#"{"pool1":"templates/new_template"}"#;

    let first = h.server.post("/api/v1/config/pooltemplate").text(body).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = h.server.post("/api/v1/config/pooltemplate").text(body).await;
    assert_body(&second, StatusCode::OK, OK_TRUE);
}

#[tokio::test]
async fn nonexistent_pool_fails() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"poolpoolpool":"templates/newtemplate"}"#)
        .await;
    assert_body(&response, StatusCode::BAD_REQUEST, &bad_templates(&["poolpoolpool"]));
}

#[tokio::test]
async fn partially_unknown_change_set_writes_nothing() {
    let h = harness(true, false);
    let before: Value = h.server.get("/api/v1/config").await.json();

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"templates/new_template","pool3":"templates/new_template2"}"#)
        .await;
    assert_body(&response, StatusCode::BAD_REQUEST, &bad_templates(&["pool3"]));

    let after: Value = h.server.get("/api/v1/config").await.json();
    assert_eq!(before, after);
}

#[tokio::test]
async fn malformed_templates_fail() {
    let h = harness(true, false);

    for template in ["template1", "/template1", "template1/"] {
        let body = json!({ "pool1": template }).to_string();
        let response = h.server.post("/api/v1/config/pooltemplate").text(body).await;
        assert_body(&response, StatusCode::BAD_REQUEST, &bad_templates(&["pool1"]));
    }

    assert_eq!(pool(&h.server, "pool1").await["template"], "templates/pool1");
}

#[tokio::test]
async fn every_bad_entry_is_reported() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"flat","pool2":"templates/ok","pool9":"templates/x"}"#)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let mut names: Vec<_> = body["bad_templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["pool1", "pool9"]);
}

#[tokio::test]
async fn template_change_through_alias() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"poolone":"templates/aliased"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);

    assert_eq!(pool(&h.server, "pool1").await["template"], "templates/aliased");
}

#[tokio::test]
async fn template_changes_disabled_return_405() {
    let h = harness(false, false);

    for body in [
        r#"{"pool1":"template/template1"}"#,
        r#"{"pool9":"bad"}"#,
        "not json",
    ] {
        let response = h.server.post("/api/v1/config/pooltemplate").text(body).await;
        assert_body(&response, StatusCode::METHOD_NOT_ALLOWED, OK_FALSE);
    }

    assert_eq!(pool(&h.server, "pool1").await["template"], "templates/pool1");
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let h = harness(true, false);

    for body in ["not json", "[]", "null", r#""pool1""#, ""] {
        let response = h.server.post("/api/v1/config/pooltemplate").text(body).await;
        assert_body(&response, StatusCode::BAD_REQUEST, OK_FALSE);
    }
}

#[tokio::test]
async fn wrongly_typed_values_are_listed_with_other_bad_entries() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"flat","pool2":null}"#)
        .await;
    assert_body(
        &response,
        StatusCode::BAD_REQUEST,
        &bad_templates(&["pool1", "pool2"]),
    );

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":[3],"pool2":true,"poolone":"2"}"#)
        .await;
    assert_body(
        &response,
        StatusCode::BAD_REQUEST,
        &bad_templates(&["pool1", "pool2"]),
    );
    assert_eq!(pool(&h.server, "pool1").await["size"], 5);
}

// =============================================================================
// POST /config/poolsize
// =============================================================================

#[tokio::test]
async fn changes_a_pool_size() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"2"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);
    assert_eq!(pool(&h.server, "pool1").await["size"], 2);
}

#[tokio::test]
async fn changes_multiple_pool_sizes() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"2","pool2":"2"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);
    assert_eq!(pool(&h.server, "pool2").await["size"], 2);
}

#[tokio::test]
async fn unchanged_size_returns_200() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"5"}"#)
        .await;
    assert_body(&response, StatusCode::OK, OK_TRUE);
}

#[tokio::test]
async fn one_changed_pool_is_enough_for_201() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"5","pool2":"5"}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);
}

#[tokio::test]
async fn size_for_unknown_pool_fails() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool10":"2"}"#)
        .await;
    assert_body(&response, StatusCode::BAD_REQUEST, &bad_templates(&["pool10"]));
}

#[tokio::test]
async fn non_integer_and_negative_sizes_fail() {
    let h = harness(true, false);

    for size in ["four", "-1", "1.5", ""] {
        let body = json!({ "pool1": size }).to_string();
        let response = h.server.post("/api/v1/config/poolsize").text(body).await;
        assert_body(&response, StatusCode::BAD_REQUEST, &bad_templates(&["pool1"]));
    }

    assert_eq!(pool(&h.server, "pool1").await["size"], 5);
}

#[tokio::test]
async fn integer_sizes_are_accepted() {
    let h = harness(true, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":3}"#)
        .await;
    assert_body(&response, StatusCode::CREATED, OK_TRUE);
    assert_eq!(pool(&h.server, "pool1").await["size"], 3);
}

#[tokio::test]
async fn size_changes_disabled_return_405() {
    let h = harness(false, false);

    let response = h
        .server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"1"}"#)
        .await;
    assert_body(&response, StatusCode::METHOD_NOT_ALLOWED, OK_FALSE);
}

// =============================================================================
// GET /token
// =============================================================================

#[tokio::test]
async fn list_tokens_with_auth_disabled_is_404() {
    let h = harness(false, false);

    let response = h
        .server
        .get("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
}

#[tokio::test]
async fn list_tokens_without_credentials_is_401() {
    let h = harness(false, true);

    let response = h.server.get("/api/v1/token").await;
    assert_body(&response, StatusCode::UNAUTHORIZED, OK_FALSE);

    let response = h
        .server
        .get("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(WRONG_PASSWORD))
        .await;
    assert_body(&response, StatusCode::UNAUTHORIZED, OK_FALSE);
}

#[tokio::test]
async fn list_tokens_when_authed() {
    let h = harness(false, true);
    let token = seed_token(&h.store, "abc", "admin");

    let response = h
        .server
        .get("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().starts_with("{\n  \"ok\": true,"));

    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["abc"]["user"], "admin");
    assert_eq!(body["abc"]["created"], json!(token.created));
}

#[tokio::test]
async fn token_named_ok_does_not_shadow_the_flag() {
    let h = harness(false, true);
    seed_token(&h.store, "ok", "admin");
    seed_token(&h.store, "abc", "admin");

    let response = h
        .server
        .get("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text().matches("\"ok\"").count(), 1);

    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["abc"]["user"], "admin");
}

// =============================================================================
// POST /token
// =============================================================================

#[tokio::test]
async fn create_token_with_auth_disabled_is_404() {
    let h = harness(false, false);

    let response = h
        .server
        .post("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
    assert!(h.store.list_tokens().unwrap().is_empty());
}

#[tokio::test]
async fn create_token_without_credentials_is_401() {
    let h = harness(false, true);

    let response = h.server.post("/api/v1/token").await;
    assert_body(&response, StatusCode::UNAUTHORIZED, OK_FALSE);
}

#[tokio::test]
async fn create_token_when_authed() {
    let h = harness(false, true);

    let response = h
        .server
        .post("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    let id = body["token"].as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    let stored = h.store.get_token(&TokenId::new(id).unwrap()).unwrap().unwrap();
    assert_eq!(stored.user, "admin");
}

// =============================================================================
// GET /token/:token
// =============================================================================

#[tokio::test]
async fn get_token_with_auth_disabled_is_404() {
    let h = harness(false, false);
    seed_token(&h.store, "this", "admin");

    let response = h.server.get("/api/v1/token/this").await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
}

#[tokio::test]
async fn get_token_needs_no_admin_credentials() {
    let h = harness(false, true);
    let token = seed_token(&h.store, "mytoken", "admin");
    h.store
        .put_vm(&VmRecord {
            hostname: "vmhostname".to_string(),
            pool: "pool1".to_string(),
            token_id: Some(token.id.clone()),
            state: VmState::Running,
        })
        .unwrap();

    let response = h.server.get("/api/v1/token/mytoken").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["mytoken"]["user"], "admin");
    assert_eq!(body["mytoken"]["created"], json!(token.created));
    assert_eq!(body["mytoken"]["vms"]["running"], json!(["vmhostname"]));
}

#[tokio::test]
async fn unknown_token_is_404() {
    let h = harness(false, true);

    let response = h.server.get("/api/v1/token/missingtoken").await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
}

#[tokio::test]
async fn created_token_round_trips() {
    let h = harness(false, true);

    let created: Value = h
        .server
        .post("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await
        .json();
    let id = created["token"].as_str().unwrap().to_string();

    let response = h.server.get(&format!("/api/v1/token/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body[&id]["user"], "admin");
    assert_eq!(body[&id]["vms"], json!({}));
}

// =============================================================================
// DELETE /token/:token
// =============================================================================

#[tokio::test]
async fn delete_token_with_auth_disabled_is_404() {
    let h = harness(false, false);
    seed_token(&h.store, "this", "admin");

    let response = h
        .server
        .delete("/api/v1/token/this")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
    assert_eq!(h.store.list_tokens().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_token_without_credentials_is_401() {
    let h = harness(false, true);
    seed_token(&h.store, "this", "admin");

    let response = h.server.delete("/api/v1/token/this").await;
    assert_body(&response, StatusCode::UNAUTHORIZED, OK_FALSE);
    assert_eq!(h.store.list_tokens().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_token_when_authed() {
    let h = harness(false, true);
    seed_token(&h.store, "mytoken", "admin");

    let response = h
        .server
        .delete("/api/v1/token/mytoken")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_body(&response, StatusCode::OK, OK_TRUE);
    assert!(h.store.list_tokens().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_missing_token_is_401() {
    let h = harness(false, true);

    let response = h
        .server
        .delete("/api/v1/token/missingtoken")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;
    assert_body(&response, StatusCode::UNAUTHORIZED, OK_FALSE);
}

// =============================================================================
// Middleware rejections
// =============================================================================

#[tokio::test]
async fn oversized_body_is_413_with_json_body() {
    let config = GatewayConfig {
        max_body_bytes: 64,
        ..GatewayConfig::default()
    };
    let h = harness_with_config(true, false, config);

    let body = json!({ "pool1": format!("templates/{}", "x".repeat(256)) }).to_string();
    let response = h.server.post("/api/v1/config/pooltemplate").text(body).await;
    assert_body(&response, StatusCode::PAYLOAD_TOO_LARGE, OK_FALSE);
    assert_eq!(response.header(CONTENT_TYPE), "application/json");

    assert_eq!(pool(&h.server, "pool1").await["template"], "templates/pool1");
}

#[tokio::test]
async fn unknown_route_is_404_with_json_body() {
    let h = harness(true, true);

    let response = h.server.get("/api/v1/nothing").await;
    assert_body(&response, StatusCode::NOT_FOUND, OK_FALSE);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn control_plane_events_are_counted() {
    let h = harness(true, true);

    h.server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"2"}"#)
        .await;
    h.server
        .post("/api/v1/config/poolsize")
        .text(r#"{"pool1":"2"}"#)
        .await;
    h.server
        .post("/api/v1/config/pooltemplate")
        .text(r#"{"pool1":"flat"}"#)
        .await;
    let created: Value = h
        .server
        .post("/api/v1/token")
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await
        .json();
    h.server
        .delete(&format!("/api/v1/token/{}", created["token"].as_str().unwrap()))
        .add_header(AUTHORIZATION, HeaderValue::from_static(ADMIN))
        .await;

    assert_eq!(h.metrics.count("config.size.applied"), 1);
    assert_eq!(h.metrics.count("config.size.unchanged"), 1);
    assert_eq!(h.metrics.count("config.template.rejected"), 1);
    assert_eq!(h.metrics.count("token.created"), 1);
    assert_eq!(h.metrics.count("token.deleted"), 1);

    let response = h.server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .text()
        .contains(r#"vmpool_events_total{event="config.size.applied"} 1"#));
}
