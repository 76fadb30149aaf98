// crates/authz-gate-server/src/lib.rs
// ============================================================================
// Module: Authz Gate Server Library
// Description: Decision endpoint, caller auth, audit sinks, and client.
// Purpose: Serve authorization decisions to internal services over HTTP.
// Dependencies: authz-gate-config, authz-gate-core, axum, reqwest
// ============================================================================

//! ## Overview
//! This crate wraps the decision engine in an axum service. Calling services
//! reach it through [`DecisionClient`], which fails closed. The server side is
//! assembled from config by [`AuthzServer::from_config`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod client;
pub mod protocol;
pub mod resolver;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DecisionAuditEvent;
pub use audit::DecisionAuditSink;
pub use audit::FileDecisionAuditSink;
pub use audit::NoopDecisionAuditSink;
pub use audit::StderrDecisionAuditSink;
pub use auth::CallerAuthMethod;
pub use auth::CallerAuthenticator;
pub use auth::INTERNAL_SECRET_HEADER;
pub use client::ClientError;
pub use client::DecisionClient;
pub use protocol::AuthorizeRequest;
pub use protocol::ErrorBody;
pub use protocol::RequestError;
pub use resolver::build_resolver;
pub use server::AUTHORIZE_PATH;
pub use server::AuthzServer;
pub use server::HEALTH_PATH;
pub use server::ServerError;
pub use server::build_audit_sink;
