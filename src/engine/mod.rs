//! Diagnostic engine facade.
//!
//! Holds the loaded descriptor registry and exposes the four diagnostic
//! operations by name, each taking a string-keyed argument bag. The engine
//! knows nothing about JSON-RPC or transports; hosts look tools up in the
//! dispatch table and encode the outputs themselves.
//!
//! The engine is re-entrant: the registry is immutable after construction
//! and every request owns its own transient reports.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::audit::audit_environment;
use crate::config::EcosystemDescriptor;
use crate::detect::detect_ecosystems;
use crate::infra::check_infrastructure;
use crate::reconcile::reconcile_environment;
use crate::utils::CancelToken;
use crate::verify::{verify_build_freshness, Issue};

/// Fixed response when detection finds nothing. Not an error.
pub const NO_ECOSYSTEMS: &str = "No ecosystems detected in project";

/// What a tool returns: a structured report or a plain string.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Report(Value),
}

impl ToolOutput {
    /// Render for a text transport; reports become pretty JSON.
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Text(s) => s.clone(),
            ToolOutput::Report(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

type Handler = fn(&Engine, &Value, &CancelToken) -> Result<ToolOutput>;

/// One dispatchable operation.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    handler: Handler,
}

static TOOLS: [ToolSpec; 4] = [
    ToolSpec {
        name: "verify_build_freshness",
        description: "Check whether compiled build artifacts are stale with respect to the project's source manifests",
        handler: handle_verify_build_freshness,
    },
    ToolSpec {
        name: "check_infrastructure_parity",
        description: "Check that required runtime services are present and the language version satisfies the project's requirements",
        handler: handle_check_infrastructure_parity,
    },
    ToolSpec {
        name: "env_var_audit",
        description: "Find environment variables referenced by the source code and report which are missing from the process environment",
        handler: handle_env_var_audit,
    },
    ToolSpec {
        name: "reconcile_environment",
        description: "Run the recorded remediation commands for the fixable issues detected in the project",
        handler: handle_reconcile_environment,
    },
];

/// The dispatch table. Hosts iterate this to advertise tools.
pub fn tools() -> &'static [ToolSpec] {
    &TOOLS
}

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    tools().iter().find(|t| t.name == name)
}

/// The diagnostic engine. Construct once, share freely.
pub struct Engine {
    descriptors: Vec<EcosystemDescriptor>,
}

impl Engine {
    pub fn new(descriptors: Vec<EcosystemDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[EcosystemDescriptor] {
        &self.descriptors
    }

    /// Invoke a tool by name with a JSON argument bag.
    pub fn call(&self, tool: &str, args: &Value, cancel: &CancelToken) -> Result<ToolOutput> {
        let Some(spec) = find_tool(tool) else {
            bail!("unknown tool: {}", tool);
        };
        if cancel.is_cancelled() {
            bail!("operation cancelled");
        }
        (spec.handler)(self, args, cancel)
    }
}

/// Extract and check the `project_root` argument.
fn project_root_arg(args: &Value) -> Result<PathBuf> {
    let Some(root) = args.get("project_root").and_then(Value::as_str) else {
        bail!("project_root is required");
    };
    let root = PathBuf::from(root);
    if !root.is_dir() {
        bail!("project root not found: {}", root.display());
    }
    Ok(root)
}

fn handle_verify_build_freshness(
    engine: &Engine,
    args: &Value,
    cancel: &CancelToken,
) -> Result<ToolOutput> {
    let root = project_root_arg(args)?;
    let ecosystems = detect_ecosystems(&root, &engine.descriptors);
    if ecosystems.is_empty() {
        return Ok(ToolOutput::Text(NO_ECOSYSTEMS.to_string()));
    }

    let mut reports = Vec::new();
    for ecosystem in &ecosystems {
        reports.push(verify_build_freshness(ecosystem, cancel)?);
    }

    match reports.into_iter().next() {
        Some(report) => Ok(ToolOutput::Report(serde_json::to_value(report)?)),
        None => Ok(ToolOutput::Text("No verification reports generated".to_string())),
    }
}

fn handle_check_infrastructure_parity(
    engine: &Engine,
    args: &Value,
    cancel: &CancelToken,
) -> Result<ToolOutput> {
    let root = project_root_arg(args)?;
    let ecosystems = detect_ecosystems(&root, &engine.descriptors);
    let Some(first) = ecosystems.first() else {
        return Ok(ToolOutput::Text(NO_ECOSYSTEMS.to_string()));
    };

    let report = check_infrastructure(first, cancel)?;
    Ok(ToolOutput::Report(serde_json::to_value(report)?))
}

fn handle_env_var_audit(engine: &Engine, args: &Value, cancel: &CancelToken) -> Result<ToolOutput> {
    let root = project_root_arg(args)?;
    let ecosystems = detect_ecosystems(&root, &engine.descriptors);
    let Some(first) = ecosystems.first() else {
        return Ok(ToolOutput::Text(NO_ECOSYSTEMS.to_string()));
    };

    let report = audit_environment(first, cancel)?;
    Ok(ToolOutput::Report(serde_json::to_value(report)?))
}

fn handle_reconcile_environment(
    engine: &Engine,
    args: &Value,
    cancel: &CancelToken,
) -> Result<ToolOutput> {
    let root = project_root_arg(args)?;
    let ecosystems = detect_ecosystems(&root, &engine.descriptors);
    if ecosystems.is_empty() {
        return Ok(ToolOutput::Text(NO_ECOSYSTEMS.to_string()));
    }

    let mut issues: Vec<Issue> = Vec::new();
    for ecosystem in &ecosystems {
        issues.extend(verify_build_freshness(ecosystem, cancel)?.issues);
    }

    if issues.is_empty() {
        return Ok(ToolOutput::Text("No issues found to reconcile".to_string()));
    }

    let report = reconcile_environment(&issues, &ecosystems[0], cancel)?;
    Ok(ToolOutput::Report(serde_json::to_value(report)?))
}
