//! CLI output shapes shared by the `sentra` subcommands.

use chrono::Utc;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use sentra::verify::Severity;

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Standardized JSON envelope for all sentra commands.
#[derive(Debug, Clone, Serialize)]
pub struct SentraOutput {
    pub command: String,
    pub success: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl SentraOutput {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            timestamp: Utc::now().to_rfc3339(),
            data: None,
        }
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Severity marker for text output.
pub fn severity_icon(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✗".red(),
        Severity::Warning => "⚠".yellow(),
    }
}
