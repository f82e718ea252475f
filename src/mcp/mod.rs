//! MCP server for sentra.
//! Serves the diagnostic engine's tools over line-delimited JSON-RPC on
//! stdio, for AI assistants speaking the Model Context Protocol.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};

use crate::engine::{find_tool, tools, Engine};
use crate::utils::CancelToken;

/// MCP server wrapping one engine instance.
pub struct McpServer {
    pub name: String,
    pub version: String,
    engine: Engine,
}

/// JSON-RPC request structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response structure
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

/// MCP tool definition advertised in `tools/list`.
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl McpServer {
    pub fn new(engine: Engine) -> Self {
        Self {
            name: "sentra-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            engine,
        }
    }

    /// Run the server (stdio mode).
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let response = self.handle_request(&line);
            let response_json = serde_json::to_string(&response)?;
            writeln!(stdout, "{}", response_json)?;
            stdout.flush()?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    pub fn handle_request(&self, input: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                return JsonRpcResponse::error(None, -32700, &format!("Parse error: {}", e));
            }
        };

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_list_tools(request.id),
            "tools/call" => self.handle_call_tool(request.id, request.params),
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<serde_json::Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": self.name,
                    "version": self.version
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    fn handle_list_tools(&self, id: Option<serde_json::Value>) -> JsonRpcResponse {
        let tool_list: Vec<Tool> = tools()
            .iter()
            .map(|spec| Tool {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "project_root": {
                            "type": "string",
                            "description": "Absolute path to the project directory to diagnose"
                        }
                    },
                    "required": ["project_root"]
                }),
            })
            .collect();

        JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
    }

    fn handle_call_tool(
        &self,
        id: Option<serde_json::Value>,
        params: serde_json::Value,
    ) -> JsonRpcResponse {
        let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");

        if find_tool(name).is_none() {
            return JsonRpcResponse::error(id, -32602, &format!("Unknown tool: {}", name));
        }

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        // Each request gets its own token; the stdio transport has no way to
        // signal mid-request cancellation, so it stays unfired here.
        let cancel = CancelToken::new();

        match self.engine.call(name, &arguments, &cancel) {
            Ok(output) => JsonRpcResponse::success(
                id,
                serde_json::json!({
                    "content": [{
                        "type": "text",
                        "text": output.to_text()
                    }]
                }),
            ),
            Err(e) => JsonRpcResponse::error(id, -32000, &format!("{:#}", e)),
        }
    }
}
