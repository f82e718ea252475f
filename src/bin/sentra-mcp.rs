//! Sentra MCP Server Binary
//! Serves the diagnostic engine over line-delimited JSON-RPC on stdio for
//! AI assistants speaking the Model Context Protocol.
//!
//! ## Usage
//!
//! ```bash
//! sentra-mcp
//! ```
//!
//! Descriptors are discovered from `SENTRA_CONFIG_DIR`, then from a
//! `config/` directory next to the executable, then from the current
//! directory. The process exits non-zero only when descriptor discovery
//! itself fails.
//!
//! ## Available Tools
//!
//! - `verify_build_freshness` - compare build outputs against the manifest
//! - `check_infrastructure_parity` - probe required services and versions
//! - `env_var_audit` - find referenced-but-unset environment variables
//! - `reconcile_environment` - run recorded fixes for detected issues

use sentra::config::loader::{default_config_base, discover_descriptors};
use sentra::engine::Engine;
use sentra::mcp::McpServer;

fn main() {
    env_logger::init();

    let base = default_config_base();
    let descriptors = match discover_descriptors(&base) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error loading descriptors from {}: {:#}", base.display(), e);
            std::process::exit(1);
        }
    };

    let server = McpServer::new(Engine::new(descriptors));
    if let Err(e) = server.run() {
        eprintln!("MCP server error: {}", e);
        std::process::exit(1);
    }
}
