//! rmcp-backed tool host.
//!
//! Tools are registered at runtime through [`ToolHost`] instead of rmcp's
//! `#[tool_router]` macros, since the action set is owned by the registry.

use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{HostError, ToolHandler, ToolHost, check_shape};
use crate::dispatch::{ActionError, JsonObject};

struct HostedTool {
    descriptor: Tool,
    handler: ToolHandler,
}

pub struct McpToolServer {
    tools: BTreeMap<String, HostedTool>,
    instructions: Option<String>,
}

impl Default for McpToolServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpToolServer {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Descriptors of every registered tool, sorted by name.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.values().map(|t| t.descriptor.clone()).collect()
    }

    /// Run one tool call.
    ///
    /// Argument problems become MCP `invalid_params` errors. Failures while the
    /// action runs are returned as an error result so the calling model can see
    /// the message.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "call for unknown tool");
            return Err(ErrorData::invalid_params(
                format!("tool '{name}' not found"),
                None,
            ));
        };

        match (tool.handler)(arguments.unwrap_or_default()).await {
            Ok(output) => Ok(CallToolResult::success(vec![Content::text(output.text)])),
            Err(err) if err.is_caller_error() => {
                Err(ErrorData::invalid_params(err.to_string(), None))
            }
            Err(err @ ActionError::Encode { .. }) => {
                Err(ErrorData::internal_error(err.to_string(), None))
            }
            Err(err) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }

    /// Serve on stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!(tools = self.tool_count(), "serving MCP over stdio");
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .context("Failed to initialize MCP stdio session")?;
        let reason = service
            .waiting()
            .await
            .context("MCP session task failed")?;
        info!(?reason, "MCP session closed");
        Ok(())
    }
}

impl ToolHost for McpToolServer {
    fn register_operation(
        &mut self,
        name: &str,
        description: &str,
        handler: ToolHandler,
        parameter_shape: JsonObject,
    ) -> Result<(), HostError> {
        if self.tools.contains_key(name) {
            return Err(HostError::NameTaken(name.to_string()));
        }
        check_shape(name, &parameter_shape)?;
        let descriptor = Tool::new(
            name.to_string(),
            description.to_string(),
            Arc::new(parameter_shape),
        );
        self.tools
            .insert(name.to_string(), HostedTool { descriptor, handler });
        Ok(())
    }
}

impl ServerHandler for McpToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: self.instructions.clone(),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.dispatch(&request.name, request.arguments).await
    }
}
