// crates/authz-gate-server/src/server.rs
// ============================================================================
// Module: Decision Server
// Description: HTTP decision endpoint for internal services.
// Purpose: Expose the authorization engine over `POST /internal/authorize`.
// Dependencies: authz-gate-config, authz-gate-core, axum, tokio
// ============================================================================

//! ## Overview
//! The server authenticates the calling service, validates the request body,
//! asks the engine for a verdict under an overall deadline, and records one
//! audit event per request. Denials are normal 200 responses; only malformed
//! or unauthenticated requests produce error statuses.
//! Security posture: all request input is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use authz_gate_config::AuthzGateConfig;
use authz_gate_config::ServerAuditConfig;
use authz_gate_config::ServerAuthMode;
use authz_gate_config::ServerConfig;
use authz_gate_core::AuthorizationEngine;
use authz_gate_core::EngineConfig;
use authz_gate_core::SharedMembershipResolver;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::DecisionAuditEvent;
use crate::audit::DecisionAuditParams;
use crate::audit::DecisionAuditSink;
use crate::audit::FileDecisionAuditSink;
use crate::audit::NoopDecisionAuditSink;
use crate::audit::RejectionAuditParams;
use crate::audit::StderrDecisionAuditSink;
use crate::auth::CallerAuthenticator;
use crate::auth::CallerIdentity;
use crate::auth::INTERNAL_SECRET_HEADER;
use crate::protocol::ErrorBody;
use crate::protocol::HealthBody;
use crate::protocol::parse_decision_request;
use crate::resolver::build_resolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Decision endpoint path.
pub const AUTHORIZE_PATH: &str = "/internal/authorize";
/// Liveness endpoint path.
pub const HEALTH_PATH: &str = "/health";
/// Request identifier header (echoed on responses).
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Maximum accepted client request identifier length.
const MAX_REQUEST_ID_LENGTH: usize = 128;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Authz Gate decision server.
pub struct AuthzServer {
    /// Listener address.
    bind: SocketAddr,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl AuthzServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: &AuthzGateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let catalog =
            Arc::new(config.load_catalog().map_err(|err| ServerError::Config(err.to_string()))?);
        let resolver = build_resolver(&config.resolver, catalog)?;
        let engine_config =
            config.engine.engine_config().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        Self::with_parts(&config.server, resolver, engine_config, audit)
    }

    /// Builds a server from an already-constructed resolver and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server configuration is invalid.
    pub fn with_parts(
        server: &ServerConfig,
        resolver: SharedMembershipResolver,
        engine_config: EngineConfig,
        audit: Arc<dyn DecisionAuditSink>,
    ) -> Result<Self, ServerError> {
        let bind = server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let state = Arc::new(ServerState {
            engine: AuthorizationEngine::new(resolver, engine_config),
            authenticator: CallerAuthenticator::from_config(&server.auth),
            audit,
            max_body_bytes: server.max_body_bytes,
            decision_deadline: server.decision_deadline(),
        });
        Ok(Self {
            bind,
            state,
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the HTTP router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route(AUTHORIZE_PATH, post(handle_authorize))
            .route(HEALTH_PATH, get(handle_health))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an existing listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        emit_local_only_warning(&self.state.authenticator);
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the audit sink selected by `[server.audit]`.
///
/// # Errors
///
/// Returns [`ServerError`] when the audit log file cannot be opened.
pub fn build_audit_sink(
    config: &ServerAuditConfig,
) -> Result<Arc<dyn DecisionAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopDecisionAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileDecisionAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrDecisionAuditSink)),
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared server state for HTTP handlers.
pub(crate) struct ServerState {
    /// Decision engine.
    engine: AuthorizationEngine<SharedMembershipResolver>,
    /// Caller authentication policy.
    authenticator: CallerAuthenticator,
    /// Audit sink for decisions and rejections.
    audit: Arc<dyn DecisionAuditSink>,
    /// Maximum request body size.
    max_body_bytes: usize,
    /// Overall deadline for one decision.
    decision_deadline: Duration,
}

impl ServerState {
    /// Records a rejection and builds its error response.
    fn reject(&self, params: RejectionAuditParams<'_>, public_message: &str) -> Response {
        let status =
            StatusCode::from_u16(params.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = params.request_id.to_string();
        self.audit.record(&DecisionAuditEvent::rejection(params));
        with_request_id((status, Json(ErrorBody::new(public_message))).into_response(), &request_id)
    }
}

/// Handles `POST /internal/authorize`.
pub(crate) async fn handle_authorize(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers);
    let peer_ip = Some(peer.ip().to_string());
    let secret = headers.get(INTERNAL_SECRET_HEADER).and_then(|value| value.to_str().ok());

    let caller = match state.authenticator.authenticate(Some(peer.ip()), secret) {
        Ok(caller) => caller,
        Err(err) => {
            let params = rejection(
                &request_id,
                peer_ip,
                None,
                StatusCode::UNAUTHORIZED,
                err.to_string(),
                started,
            );
            return state.reject(params, "unauthenticated");
        }
    };

    if bytes.len() > state.max_body_bytes {
        let message = "request body too large";
        let params = rejection(
            &request_id,
            peer_ip,
            Some(&caller),
            StatusCode::PAYLOAD_TOO_LARGE,
            message.to_string(),
            started,
        );
        return state.reject(params, message);
    }

    let request = match parse_decision_request(&bytes) {
        Ok(request) => request,
        Err(err) => {
            let message = err.to_string();
            let params = rejection(
                &request_id,
                peer_ip,
                Some(&caller),
                StatusCode::BAD_REQUEST,
                message.clone(),
                started,
            );
            return state.reject(params, &message);
        }
    };

    let verdict = state.engine.decide_within(&request, state.decision_deadline).await;
    state.audit.record(&DecisionAuditEvent::decision(DecisionAuditParams {
        request_id: &request_id,
        peer_ip,
        caller: &caller,
        request: &request,
        verdict,
        elapsed: started.elapsed(),
    }));
    with_request_id((StatusCode::OK, Json(verdict)).into_response(), &request_id)
}

/// Handles `GET /health`.
pub(crate) async fn handle_health() -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds rejection audit params.
fn rejection<'a>(
    request_id: &'a str,
    peer_ip: Option<String>,
    caller: Option<&'a CallerIdentity>,
    status: StatusCode,
    message: String,
    started: Instant,
) -> RejectionAuditParams<'a> {
    RejectionAuditParams {
        request_id,
        peer_ip,
        caller,
        message,
        status: status.as_u16(),
        elapsed: started.elapsed(),
    }
}

/// Returns the caller's request id when well formed, else a fresh UUID.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| {
            !value.is_empty()
                && value.len() <= MAX_REQUEST_ID_LENGTH
                && value.bytes().all(|byte| byte.is_ascii_graphic())
        })
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string)
}

/// Sets the request id header on a response.
fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Warns when the endpoint relies on loopback-only caller auth.
fn emit_local_only_warning(authenticator: &CallerAuthenticator) {
    if authenticator.mode() == ServerAuthMode::LocalOnly {
        let _ = writeln!(
            std::io::stderr(),
            "authz-gate: WARNING: decision endpoint running in local-only mode; configure \
             server.auth to enable internal_secret"
        );
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Decision server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
