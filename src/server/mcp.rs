//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! This module provides the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Stdio-based server communication

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};
use crate::integrity::{FrictionDimension, FrictionLevel};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null if notification, must always be present per spec).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// The server name identifier.
    pub name: String,
    /// The server version string.
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// The MCP protocol version supported.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: Capabilities,
    /// Server identification information.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// The name of the tool to invoke.
    pub name: String,
    /// Optional arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (e.g., "text").
    #[serde(rename = "type")]
    pub content_type: String,
    /// The text content of the result.
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// The result content items.
    pub content: Vec<ToolResultContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server running over stdio.
///
/// Handles JSON-RPC 2.0 messages over stdin/stdout for MCP protocol
/// communication with clients.
pub struct McpServer {
    /// Shared application state.
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Process integrity MCP server starting...");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            // Only send response if not a notification (per JSON-RPC 2.0 spec)
            if let Some(response) = self.handle_line(&line) {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw input line.
    /// Returns None for blank lines and notifications.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        debug!(request = %trimmed, "Received request");

        match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                error!(error = %e, "Failed to parse request");
                Some(JsonRpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a single JSON-RPC request
    /// Returns None for notifications (requests without id) per JSON-RPC 2.0 spec
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Check if this is a notification (no id = no response required)
        let is_notification = request.id.is_none();

        if request.jsonrpc != "2.0" && !is_notification {
            return Some(JsonRpcResponse::error(
                request.id,
                -32600,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" => {
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params)),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                // For unknown methods, only respond if it's a request (has id)
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        -32601,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "process-integrity".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");

        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "tools": all_tools()
            }),
        )
    }

    /// Handle tools/call request
    fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let (content, is_error) = match handle_tool_call(&self.state, &params.name, params.arguments)
        {
            Ok(result) => {
                let text = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                    error!(error = %e, "Failed to serialize tool result");
                    format!("{{\"error\": \"Serialization failed: {}\"}}", e)
                });
                (
                    ToolResultContent {
                        content_type: "text".to_string(),
                        text,
                    },
                    None,
                )
            }
            Err(e) => (
                ToolResultContent {
                    content_type: "text".to_string(),
                    text: format!("Error: {}", e),
                },
                Some(true),
            ),
        };

        let tool_result = ToolCallResult {
            content: vec![content],
            is_error,
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }
}

/// Every tool advertised by the server.
pub fn all_tools() -> Vec<Tool> {
    vec![
        get_check_tool(),
        get_validate_override_tool(),
        get_record_override_tool(),
        get_analyze_conviction_tool(),
        get_research_quality_tool(),
        get_time_in_thesis_tool(),
    ]
}

fn friction_level_enum() -> Value {
    serde_json::json!([
        FrictionLevel::None.as_str(),
        FrictionLevel::Soft.as_str(),
        FrictionLevel::Medium.as_str(),
        FrictionLevel::Hard.as_str()
    ])
}

fn check_request_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "symbol": { "type": "string", "description": "Ticker symbol" },
            "action": { "type": "string", "enum": ["BUY", "SELL"] },
            "thesis_id": { "type": "string", "description": "Thesis backing the action" },
            "user_id": { "type": "string", "description": "User attempting the action" }
        },
        "required": ["symbol", "action", "user_id"]
    })
}

fn research_session_properties() -> Value {
    serde_json::json!({
        "tool_usage": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "tool": { "type": "string" },
                    "count": { "type": "integer", "minimum": 0 },
                    "symbols": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["tool"]
            }
        },
        "tools_used_count": { "type": "integer", "minimum": 0 },
        "unique_tools_used": { "type": "integer", "minimum": 0 },
        "devils_advocate_engaged": { "type": "boolean" },
        "assumptions_documented": { "type": "integer", "minimum": 0 },
        "started_at": { "type": "string", "format": "date-time" },
        "ended_at": { "type": "string", "format": "date-time" }
    })
}

fn conviction_history_schema() -> Value {
    serde_json::json!({
        "type": "array",
        "description": "Prior conviction analyses for the thesis, oldest first",
        "items": {
            "type": "object",
            "properties": {
                "statement_text": { "type": "string" },
                "source_type": { "type": "string", "enum": ["chat", "thesis_hypothesis", "journal"] },
                "conviction_score": { "type": "number", "minimum": 0, "maximum": 100 },
                "certainty_indicators": { "type": "array", "items": { "type": "string" } },
                "hedging_indicators": { "type": "array", "items": { "type": "string" } },
                "analyzed_at": { "type": "string", "format": "date-time" }
            },
            "required": ["conviction_score", "analyzed_at"]
        }
    })
}

fn evolution_events_schema() -> Value {
    serde_json::json!({
        "type": "array",
        "description": "Thesis evolution events, oldest first",
        "items": {
            "type": "object",
            "properties": {
                "event_type": {
                    "type": "string",
                    "enum": [
                        "hypothesis_refined",
                        "target_adjusted",
                        "invalidation_updated",
                        "evidence_added",
                        "confidence_changed",
                        "status_changed"
                    ]
                },
                "previous_value": { "type": "string" },
                "new_value": { "type": "string" },
                "created_at": { "type": "string", "format": "date-time" },
                "confidence_delta": { "type": "number" }
            },
            "required": ["event_type", "created_at"]
        }
    })
}

/// Get the full integrity check tool definition
fn get_check_tool() -> Tool {
    Tool {
        name: "integrity_check".to_string(),
        description: "Evaluate whether a trading action is ready to execute. Scores research quality, time in thesis and conviction integrity, and returns a graded friction decision (none, soft, medium, hard).".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "request": check_request_schema(),
                "research_session": {
                    "type": "object",
                    "properties": research_session_properties()
                },
                "thesis": {
                    "type": "object",
                    "properties": {
                        "first_mentioned_at": { "type": "string", "format": "date-time" },
                        "created_at": { "type": "string", "format": "date-time" }
                    }
                },
                "evolution_events": evolution_events_schema(),
                "statements": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Statements to score for conviction"
                },
                "conviction_history": conviction_history_schema(),
                "recent_override_count": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Overrides by this user in the last 7 days"
                },
                "evaluated_at": { "type": "string", "format": "date-time" }
            },
            "required": ["request"]
        }),
    }
}

/// Get the override validation tool definition
fn get_validate_override_tool() -> Tool {
    Tool {
        name: "integrity_validate_override".to_string(),
        description: "Validate a request to proceed despite friction. Hard friction requires a written justification.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "friction_level": { "type": "string", "enum": friction_level_enum() },
                "user_reasoning": { "type": "string" }
            },
            "required": ["friction_level"],
            "additionalProperties": false
        }),
    }
}

/// Get the override record tool definition
fn get_record_override_tool() -> Tool {
    Tool {
        name: "integrity_record_override".to_string(),
        description: "Validate an override of a completed check and, when accepted, return the audit record for the caller to persist.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "request": check_request_schema(),
                "response": {
                    "type": "object",
                    "description": "The integrity_check result being overridden"
                },
                "user_reasoning": { "type": "string" },
                "created_at": { "type": "string", "format": "date-time" }
            },
            "required": ["request", "response"]
        }),
    }
}

/// Get the conviction analysis tool definition
fn get_analyze_conviction_tool() -> Tool {
    Tool {
        name: "integrity_analyze_conviction".to_string(),
        description: "Score the lexical certainty of statements and classify the conviction trend against prior analyses.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "statements": { "type": "array", "items": { "type": "string" } },
                "history": conviction_history_schema()
            },
            "additionalProperties": false
        }),
    }
}

/// Get the research quality tool definition
fn get_research_quality_tool() -> Tool {
    let mut properties = research_session_properties();
    if let Some(map) = properties.as_object_mut() {
        map.insert(
            "evaluated_at".to_string(),
            serde_json::json!({ "type": "string", "format": "date-time" }),
        );
    }

    Tool {
        name: "integrity_research_quality".to_string(),
        description: format!(
            "Score a research session (0-100) across tool usage, devil's advocate, assumptions and time spent. Feeds the {} dimension.",
            FrictionDimension::ResearchQuality
        ),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": properties
        }),
    }
}

/// Get the time-in-thesis tool definition
fn get_time_in_thesis_tool() -> Tool {
    Tool {
        name: "integrity_time_in_thesis".to_string(),
        description: "Compute hours in development, maturity level and the rushed flag for a thesis.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "first_mentioned_at": { "type": "string", "format": "date-time" },
                "created_at": { "type": "string", "format": "date-time" },
                "evolution_events": evolution_events_schema(),
                "evolution_event_count": { "type": "integer", "minimum": 0 },
                "evaluated_at": { "type": "string", "format": "date-time" }
            },
            "additionalProperties": false
        }),
    }
}
