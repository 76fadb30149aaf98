// crates/authz-gate-server/src/audit.rs
// ============================================================================
// Module: Decision Audit Logging
// Description: Structured audit events for decision endpoint requests.
// Purpose: Emit one JSON line per decision or rejected caller.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every request that reaches the decision endpoint produces exactly one
//! audit event: a decision (allow or deny) or a rejection (caller not
//! authenticated or request malformed). Sinks are deliberately small so
//! deployments can route JSON lines to their own pipeline. Secrets never
//! appear in events; only their fingerprint does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use authz_gate_core::DecisionRequest;
use authz_gate_core::Verdict;
use serde::Serialize;

use crate::auth::CallerAuthMethod;
use crate::auth::CallerIdentity;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier.
    pub request_id: String,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Caller authentication method when authenticated.
    pub auth_method: Option<CallerAuthMethod>,
    /// Caller secret fingerprint when secret auth was used.
    pub secret_fingerprint: Option<String>,
    /// Principal identifier when the request parsed.
    pub user_id: Option<String>,
    /// Organization scope when present.
    pub organization_id: Option<String>,
    /// Workspace scope when present.
    pub workspace_id: Option<String>,
    /// Requested permission when the request parsed.
    pub permission: Option<String>,
    /// Whether access was allowed.
    pub allowed: bool,
    /// Verdict reason code or rejection message.
    pub reason: Option<String>,
    /// HTTP status returned to the caller.
    pub status: u16,
    /// Handler latency in microseconds.
    pub elapsed_us: u64,
}

/// Inputs required to construct a decision audit event.
pub struct DecisionAuditParams<'a> {
    /// Request identifier.
    pub request_id: &'a str,
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Authenticated caller.
    pub caller: &'a CallerIdentity,
    /// Evaluated request.
    pub request: &'a DecisionRequest,
    /// Engine verdict.
    pub verdict: Verdict,
    /// Handler latency.
    pub elapsed: Duration,
}

/// Inputs required to construct a rejection audit event.
pub struct RejectionAuditParams<'a> {
    /// Request identifier.
    pub request_id: &'a str,
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Caller when authentication succeeded before the rejection.
    pub caller: Option<&'a CallerIdentity>,
    /// Rejection message.
    pub message: String,
    /// HTTP status returned to the caller.
    pub status: u16,
    /// Handler latency.
    pub elapsed: Duration,
}

impl DecisionAuditEvent {
    /// Builds an event for an evaluated decision.
    #[must_use]
    pub fn decision(params: DecisionAuditParams<'_>) -> Self {
        Self {
            event: "authz_decision",
            timestamp_ms: now_ms(),
            request_id: params.request_id.to_string(),
            peer_ip: params.peer_ip,
            auth_method: Some(params.caller.method),
            secret_fingerprint: params.caller.secret_fingerprint.clone(),
            user_id: Some(params.request.principal_id.to_string()),
            organization_id: params.request.organization_id.as_ref().map(ToString::to_string),
            workspace_id: params.request.workspace_id.as_ref().map(ToString::to_string),
            permission: Some(params.request.permission.as_str().to_string()),
            allowed: params.verdict.allowed,
            reason: params.verdict.reason.map(|reason| reason.as_str().to_string()),
            status: 200,
            elapsed_us: micros(params.elapsed),
        }
    }

    /// Builds an event for a request rejected before evaluation.
    #[must_use]
    pub fn rejection(params: RejectionAuditParams<'_>) -> Self {
        Self {
            event: "authz_rejected",
            timestamp_ms: now_ms(),
            request_id: params.request_id.to_string(),
            peer_ip: params.peer_ip,
            auth_method: params.caller.map(|caller| caller.method),
            secret_fingerprint: params.caller.and_then(|caller| caller.secret_fingerprint.clone()),
            user_id: None,
            organization_id: None,
            workspace_id: None,
            permission: None,
            allowed: false,
            reason: Some(params.message),
            status: params.status,
            elapsed_us: micros(params.elapsed),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for decision endpoint events.
pub trait DecisionAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &DecisionAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrDecisionAuditSink;

impl DecisionAuditSink for StderrDecisionAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileDecisionAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileDecisionAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DecisionAuditSink for FileDecisionAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopDecisionAuditSink;

impl DecisionAuditSink for NoopDecisionAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Saturating microsecond count.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use authz_gate_core::DecisionReason;
    use authz_gate_core::Permission;

    use super::*;

    fn secret_caller() -> CallerIdentity {
        CallerIdentity {
            method: CallerAuthMethod::InternalSecret,
            secret_fingerprint: Some("0011223344556677".to_string()),
        }
    }

    #[test]
    fn decision_event_carries_request_fields() {
        let request = DecisionRequest::new("u-9", Permission::parse("workspace:task:read").unwrap())
            .with_workspace("7c9e6679-7425-40de-944b-e07fc1f90ae7");
        let caller = secret_caller();
        let event = DecisionAuditEvent::decision(DecisionAuditParams {
            request_id: "req-1",
            peer_ip: Some("127.0.0.1".to_string()),
            caller: &caller,
            request: &request,
            verdict: Verdict::deny(DecisionReason::InsufficientPermission),
            elapsed: Duration::from_micros(42),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "authz_decision");
        assert_eq!(json["auth_method"], "internal_secret");
        assert_eq!(json["user_id"], "u-9");
        assert_eq!(json["reason"], "insufficient-permission");
        assert_eq!(json["allowed"], false);
        assert_eq!(json["elapsed_us"], 42);
        assert!(json["organization_id"].is_null());
    }

    #[test]
    fn rejection_event_without_caller_has_no_auth_method() {
        let event = DecisionAuditEvent::rejection(RejectionAuditParams {
            request_id: "req-2",
            peer_ip: None,
            caller: None,
            message: "unauthenticated: missing internal secret".to_string(),
            status: 401,
            elapsed: Duration::ZERO,
        });
        assert_eq!(event.event, "authz_rejected");
        assert!(event.auth_method.is_none());
        assert_eq!(event.status, 401);
        assert!(!event.allowed);
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileDecisionAuditSink::new(&path).unwrap();
        for status in [400_u16, 401] {
            sink.record(&DecisionAuditEvent::rejection(RejectionAuditParams {
                request_id: "req-3",
                peer_ip: None,
                caller: None,
                message: "rejected".to_string(),
                status,
                elapsed: Duration::ZERO,
            }));
        }
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], 401);
    }
}
