//! Sentra - development-environment health service
//! Configuration-driven diagnostics for AI coding assistants: ecosystem
//! detection, build freshness, infrastructure parity, environment-variable
//! audits and issue reconciliation, exposed through an MCP-consumable
//! engine facade.

pub mod audit;
pub mod config;
pub mod detect;
pub mod engine;
pub mod infra;
pub mod mcp;
pub mod reconcile;
pub mod utils;
pub mod verify;
pub mod version;

// Re-export main types for convenience
pub use audit::{audit_environment, EnvVarReference, EnvVarReport};
pub use config::{loader::discover_descriptors, loader::load_descriptor, EcosystemDescriptor};
pub use detect::{detect_ecosystems, DetectedEcosystem};
pub use engine::{Engine, ToolOutput, NO_ECOSYSTEMS};
pub use infra::{check_infrastructure, InfrastructureReport, ServiceStatus};
pub use reconcile::{reconcile_environment, FixResult, ReconciliationReport};
pub use utils::CancelToken;
pub use verify::{verify_build_freshness, FreshnessReport, Issue, IssueKind, Severity};
pub use version::{probe_version, validate::validate_version, VersionInfo};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
