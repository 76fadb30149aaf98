// crates/authz-gate-server/tests/router.rs
// ============================================================================
// Module: Router Integration Tests
// Description: End-to-end router checks built from TOML configuration.
// Purpose: Exercise config, resolver wiring, and routing together.
// Dependencies: authz-gate-config, authz-gate-server, tower
// ============================================================================
//! ## Overview
//! Builds servers with [`AuthzServer::from_config`] and drives the router
//! with `tower::ServiceExt::oneshot`, injecting the peer address with
//! axum's `MockConnectInfo`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::SocketAddr;

use authz_gate_config::AuthzGateConfig;
use authz_gate_server::AUTHORIZE_PATH;
use authz_gate_server::AuthzServer;
use authz_gate_server::HEALTH_PATH;
use authz_gate_server::INTERNAL_SECRET_HEADER;
use authz_gate_server::ServerError;
use axum::Router;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

const ORG: &str = "b7d1c0de-0000-4e00-9a00-000000000001";
const WORKSPACE: &str = "b7d1c0de-0000-4e00-9a00-0000000000a1";
const SECRET: &str = "router-test-secret-0001";

fn fixture_toml() -> String {
    format!(
        r#"
[server.audit]
enabled = false

[resolver.cache]
ttl_ms = 1000

[[resolver.workspaces]]
id = "{WORKSPACE}"
organization_id = "{ORG}"

[[resolver.organization_members]]
user_id = "olga"
organization_id = "{ORG}"
role = "org:admin"

[[resolver.organization_members]]
user_id = "mo"
organization_id = "{ORG}"
role = "org:member"

[[resolver.workspace_members]]
user_id = "mo"
workspace_id = "{WORKSPACE}"
role = "workspace:member"
"#
    )
}

fn app(text: &str, peer: [u8; 4]) -> Router {
    let config = AuthzGateConfig::from_toml_str(text).unwrap();
    let server = AuthzServer::from_config(&config).unwrap();
    server.router().layer(MockConnectInfo(SocketAddr::from((peer, 50_000))))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn authorize_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(AUTHORIZE_PATH)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
    let (status, body) = call(app(&fixture_toml(), [127, 0, 0, 1]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn organization_admin_overrides_workspace_membership() {
    let body = json!({
        "userId": "olga",
        "workspaceId": WORKSPACE,
        "permission": "workspace:schedule:delete",
    });
    let (status, verdict) =
        call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict, json!({"allowed": true, "reason": "organization-admin-override"}));
}

#[tokio::test]
async fn organization_member_lacks_org_permission() {
    let body = json!({"userId": "mo", "organizationId": ORG, "permission": "org:settings"});
    let (status, verdict) =
        call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        verdict,
        json!({"allowed": false, "reason": "insufficient-organization-permission"})
    );
}

#[tokio::test]
async fn workspace_member_gets_direct_grant() {
    let body = json!({"userId": "mo", "workspaceId": WORKSPACE, "permission": "workspace:task:write"});
    let (_, verdict) = call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(verdict, json!({"allowed": true}));
}

#[tokio::test]
async fn super_admin_claim_bypasses_checks() {
    let body = json!({
        "userId": "nobody",
        "workspaceId": "b7d1c0de-0000-4e00-9a00-00000000ffff",
        "permission": "workspace:task:delete",
        "userRole": "admin",
    });
    let (_, verdict) = call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(verdict, json!({"allowed": true, "reason": "super-admin"}));
}

#[tokio::test]
async fn missing_workspace_scope_is_denied() {
    let body = json!({"userId": "mo", "permission": "workspace:task:read"});
    let (status, verdict) =
        call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict, json!({"allowed": false, "reason": "missing-workspace-id"}));
}

#[tokio::test]
async fn unknown_workspace_is_not_found() {
    let body = json!({
        "userId": "mo",
        "workspaceId": "b7d1c0de-0000-4e00-9a00-00000000ffff",
        "permission": "workspace:task:read",
    });
    let (_, verdict) = call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(verdict, json!({"allowed": false, "reason": "workspace-not-found"}));
}

#[tokio::test]
async fn empty_user_is_bad_request() {
    let body = json!({"userId": "", "organizationId": ORG, "permission": "org:users"});
    let (status, error) =
        call(app(&fixture_toml(), [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({"error": "missing required field: userId"}));
}

#[tokio::test]
async fn remote_peer_needs_secret() {
    let text = format!(
        "{}\n[server]\nbind = \"0.0.0.0:10001\"\n\n[server.auth]\nmode = \
         \"internal_secret\"\ninternal_secrets = [\"{SECRET}\"]\n",
        fixture_toml()
    );
    let body = json!({"userId": "mo", "workspaceId": WORKSPACE, "permission": "workspace:task:read"});

    let (status, _) = call(app(&text, [192, 168, 4, 20]), authorize_request(&body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = authorize_request(&body);
    request.headers_mut().insert(INTERNAL_SECRET_HEADER, SECRET.parse().unwrap());
    let (status, verdict) = call(app(&text, [192, 168, 4, 20]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict, json!({"allowed": true}));
}

#[tokio::test]
async fn uppercase_fixture_uuids_resolve_for_any_request_spelling() {
    let upper_org = ORG.to_uppercase();
    let upper_workspace = WORKSPACE.to_uppercase();
    let text = format!(
        r#"
[server.audit]
enabled = false

[[resolver.workspaces]]
id = "{upper_workspace}"
organization_id = "{upper_org}"

[[resolver.organization_members]]
user_id = "olga"
organization_id = "{upper_org}"
role = "org:admin"

[[resolver.workspace_members]]
user_id = "mo"
workspace_id = "{upper_workspace}"
role = "workspace:member"
"#
    );
    let simple_workspace = WORKSPACE.replace('-', "");
    let braced_workspace = format!("{{{WORKSPACE}}}");
    for workspace in
        [upper_workspace.as_str(), WORKSPACE, simple_workspace.as_str(), braced_workspace.as_str()]
    {
        let body = json!({"userId": "mo", "workspaceId": workspace, "permission": "workspace:task:read"});
        let (status, verdict) = call(app(&text, [127, 0, 0, 1]), authorize_request(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verdict, json!({"allowed": true}));
    }

    let body = json!({"userId": "olga", "workspaceId": WORKSPACE, "permission": "workspace:task:delete"});
    let (_, verdict) = call(app(&text, [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(verdict, json!({"allowed": true, "reason": "organization-admin-override"}));

    let body = json!({"userId": "olga", "organizationId": ORG, "permission": "org:workspaces"});
    let (_, verdict) = call(app(&text, [127, 0, 0, 1]), authorize_request(&body)).await;
    assert_eq!(verdict, json!({"allowed": true}));
}

#[test]
fn invalid_catalog_path_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing-catalog.toml");
    let text = format!("[catalog]\npath = '{}'\n", missing.display());
    let config = AuthzGateConfig::from_toml_str(&text).unwrap();
    assert!(matches!(AuthzServer::from_config(&config), Err(ServerError::Config(_))));
}
