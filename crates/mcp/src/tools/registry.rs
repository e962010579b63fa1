// Tool trait, registry, and dispatch.

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolContent, ToolSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A named, schema-described operation exposed to the calling agent.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema advertised via tools/list.
    fn schema(&self) -> ToolSchema;

    /// Run the tool and produce its success payload.
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError>;

    /// Whether a call changes account state at the venue (order
    /// placement, cancellation, liquidation). Such calls are neither
    /// idempotent nor reversible from here.
    fn is_mutating(&self) -> bool {
        false
    }
}

/// Registry of available tools.
///
/// Keeps registration order: the catalog order returned by
/// `list_schemas` is part of the observable contract and must be stable
/// across calls.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. Catalog position is registration order.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| &self.tools[idx])
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// List all tool schemas in registration order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name and normalize the outcome.
    ///
    /// Never faults: unknown names, bad arguments, and remote failures
    /// all come back as an error payload the caller can inspect.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> CallToolResult {
        let outcome = match self.get(name) {
            Some(tool) => {
                if tool.is_mutating() {
                    info!(tool = name, "dispatching side-effecting tool");
                } else {
                    debug!(tool = name, "dispatching tool");
                }
                tool.execute(arguments).await
            }
            None => Err(ToolError::UnknownTool(name.to_string())),
        };

        match outcome {
            Ok(payload) => CallToolResult {
                content: vec![ToolContent::text(render(&payload))],
                is_error: None,
            },
            Err(err) => {
                debug!(tool = name, error = %err, "tool call failed");
                let payload = serde_json::json!({ "error": err.to_string() });
                CallToolResult {
                    content: vec![ToolContent::text(render(&payload))],
                    is_error: Some(true),
                }
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pretty-print a payload as the outward text block.
fn render(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

/// Deserialize a tool's arguments, flattening any serde failure
/// (missing key, wrong type, rejected enum value) into a caller error.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

// Helper functions for building tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_enum(description: &str, values: &[&str]) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "enum": values
    })
}

pub fn json_schema_enum_with_default(description: &str, values: &[&str], default: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "enum": values,
        "default": default
    })
}

pub fn json_schema_boolean_with_default(description: &str, default: bool) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description,
        "default": default
    })
}
