// crates/authz-gate-cli/src/main.rs
// ============================================================================
// Module: Authz Gate CLI Entry Point
// Description: Command dispatcher for serving and checking Authz Gate.
// Purpose: Run the decision server and offline config, catalog, and decision checks.
// Dependencies: authz-gate-config, authz-gate-core, authz-gate-server, clap, tokio
// ============================================================================

//! ## Overview
//! The `authz-gate` binary starts the decision endpoint and offers offline
//! tooling: config validation, catalog checks, and one-off decisions against
//! the configured resolver. Security posture: inputs are untrusted and must
//! be validated before use.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use authz_gate_config::AuthzGateConfig;
use authz_gate_config::load_catalog;
use authz_gate_core::AuthorizationEngine;
use authz_gate_server::AuthorizeRequest;
use authz_gate_server::AuthzServer;
use authz_gate_server::build_resolver;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Authz Gate command-line interface.
#[derive(Parser, Debug)]
#[command(name = "authz-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the decision endpoint.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Permission catalog utilities.
    Catalog {
        /// Selected catalog subcommand.
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Evaluate one decision against the configured resolver.
    Decide(DecideCommand),
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to authz-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an Authz Gate configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to authz-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Validate a catalog file and summarize its roles.
    Check(CatalogCheckCommand),
}

/// Arguments for `catalog check`.
#[derive(Args, Debug)]
struct CatalogCheckCommand {
    /// Catalog TOML file.
    #[arg(long, value_name = "FILE")]
    path: PathBuf,
}

/// Arguments for `decide`.
#[derive(Args, Debug)]
struct DecideCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Principal identifier.
    #[arg(long, value_name = "ID")]
    user: String,
    /// Organization UUID.
    #[arg(long, value_name = "ID")]
    org: Option<String>,
    /// Workspace UUID.
    #[arg(long, value_name = "ID")]
    workspace: Option<String>,
    /// Permission to check.
    #[arg(long, value_name = "PERMISSION")]
    permission: String,
    /// Global role claim.
    #[arg(long, value_name = "ROLE")]
    role: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(&command),
        Commands::Catalog {
            command: CatalogCommand::Check(command),
        } => command_catalog_check(&command),
        Commands::Decide(command) => command_decide(command).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `serve`.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = AuthzGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || AuthzServer::from_config(&config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("authz-gate: listening on {}", server.bind_addr()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = AuthzGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    config.load_catalog().map_err(|err| CliError::new(format!("failed to load catalog: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `catalog check`.
fn command_catalog_check(command: &CatalogCheckCommand) -> CliResult<ExitCode> {
    let catalog = load_catalog(&command.path)
        .map_err(|err| CliError::new(format!("failed to load catalog: {err}")))?;
    let mut lines = vec![format!(
        "catalog ok: {} permissions, {} roles",
        catalog.permission_count(),
        catalog.role_count()
    )];
    for (role_id, role) in catalog.roles() {
        lines.push(format!("{role_id}\t{}\t{}", role.permissions().len(), role.name()));
    }
    write_stdout_line(&lines.join("\n")).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `decide`.
async fn command_decide(command: DecideCommand) -> CliResult<ExitCode> {
    let config = AuthzGateConfig::load(Some(&command.config))
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let request = decide_request(command)
        .into_decision_request()
        .map_err(|err| CliError::new(format!("invalid decision request: {err}")))?;
    let catalog = Arc::new(
        config.load_catalog().map_err(|err| CliError::new(format!("failed to load catalog: {err}")))?,
    );
    let engine_config = config
        .engine
        .engine_config()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let resolver = build_resolver(&config.resolver, catalog)
        .map_err(|err| CliError::new(format!("resolver init failed: {err}")))?;
    let engine = AuthorizationEngine::new(resolver, engine_config);
    let verdict = engine.decide_within(&request, config.server.decision_deadline()).await;
    let payload = serde_json::to_string(&verdict)
        .map_err(|err| CliError::new(format!("failed to serialize verdict: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the wire request for `decide` arguments.
fn decide_request(command: DecideCommand) -> AuthorizeRequest {
    AuthorizeRequest {
        user_id: command.user,
        organization_id: command.org,
        workspace_id: command.workspace,
        permission: command.permission,
        user_role: command.role,
    }
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, err: &std::io::Error) -> String {
    format!("failed to write {stream}: {err}")
}

/// Emits an error and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
