// JSON-RPC 2.0 server over stdio.

use crate::protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::tools::ToolRegistry;
use anyhow::Result;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, error, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "tradedesk-mcp";

/// MCP server: serves the tool catalog and dispatches tool calls.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Process one message. Notifications (no id) get no reply.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = match request.id {
            Some(id) => id,
            None => {
                debug!(method = %request.method, "notification");
                return None;
            }
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<CallToolParams>(params) {
                    // Tool-level failures are result payloads, not
                    // JSON-RPC errors: the call itself never raises.
                    Ok(call) => {
                        let result = self.registry.dispatch(&call.name, call.arguments).await;
                        JsonRpcResponse::success(id, result)
                    }
                    Err(e) => JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string())),
                }
            }
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Serve requests from stdin, replying on stdout.
    ///
    /// Each request runs on its own task: a slow brokerage round trip
    /// never holds up the read loop or other in-flight calls. The only
    /// shared state between calls is the registry handle itself.
    pub async fn serve(self) -> Result<()> {
        let server = Arc::new(self);
        let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
        let stdout = Arc::new(Mutex::new(tokio::io::stdout()));

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "unparsable request line");
                    write_response(
                        &stdout,
                        &JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            let server = Arc::clone(&server);
            let stdout = Arc::clone(&stdout);
            tokio::spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    if let Err(e) = write_response(&stdout, &response).await {
                        error!(error = %e, "failed to write response");
                    }
                }
            });
        }

        debug!("stdin closed, shutting down");
        Ok(())
    }
}

async fn write_response(
    stdout: &Mutex<tokio::io::Stdout>,
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    let mut out = stdout.lock().await;
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
