//! Tool hosts: where bound action handlers end up.
//!
//! ToolHost      -> registration seam used by `ActionRegistry::bind_all`
//! McpToolServer -> rmcp server handler, serves the tools over stdio
//! ToolCatalog   -> collects registrations for the `tools` listing command

mod server;

pub use server::McpToolServer;

use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::{ActionError, ActionOutput, JsonObject};

/// A bound action: takes the raw argument object of one call.
pub type ToolHandler =
    Arc<dyn Fn(JsonObject) -> BoxFuture<'static, Result<ActionOutput, ActionError>> + Send + Sync>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("tool '{0}' is already registered with the host")]
    NameTaken(String),

    #[error("tool '{name}' has an unusable parameter shape: {reason}")]
    InvalidShape { name: String, reason: String },
}

/// Registration API of a tool-serving runtime.
pub trait ToolHost {
    fn register_operation(
        &mut self,
        name: &str,
        description: &str,
        handler: ToolHandler,
        parameter_shape: JsonObject,
    ) -> Result<(), HostError>;
}

/// MCP requires tool input schemas to describe an object.
pub(crate) fn check_shape(name: &str, shape: &JsonObject) -> Result<(), HostError> {
    match shape.get("type").and_then(|v| v.as_str()) {
        Some("object") => Ok(()),
        Some(other) => Err(HostError::InvalidShape {
            name: name.to_string(),
            reason: format!("expected type 'object', found '{other}'"),
        }),
        None => Err(HostError::InvalidShape {
            name: name.to_string(),
            reason: "missing 'type'".to_string(),
        }),
    }
}

/// One registered tool as shown by the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub parameters: JsonObject,
}

impl CatalogEntry {
    /// `(name, type, required)` for every declared parameter, in schema order.
    pub fn parameter_summary(&self) -> Vec<(String, String, bool)> {
        let required: Vec<&str> = self
            .parameters
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let Some(props) = self.parameters.get("properties").and_then(|v| v.as_object()) else {
            return Vec::new();
        };
        props
            .iter()
            .map(|(pname, pobj)| {
                let ptype = match pobj.get("type") {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    // ["integer", "null"] style optionals
                    Some(serde_json::Value::Array(types)) => types
                        .iter()
                        .filter_map(|t| t.as_str())
                        .find(|t| *t != "null")
                        .unwrap_or("any")
                        .to_string(),
                    _ if pobj.get("$ref").is_some() || pobj.get("enum").is_some() => {
                        "enum".to_string()
                    }
                    _ => "any".to_string(),
                };
                (pname.clone(), ptype, required.contains(&pname.as_str()))
            })
            .collect()
    }
}

/// Host that only records what was registered. Handlers are dropped.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl ToolHost for ToolCatalog {
    fn register_operation(
        &mut self,
        name: &str,
        description: &str,
        _handler: ToolHandler,
        parameter_shape: JsonObject,
    ) -> Result<(), HostError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(HostError::NameTaken(name.to_string()));
        }
        check_shape(name, &parameter_shape)?;
        self.entries.push(CatalogEntry {
            name: name.to_string(),
            description: description.to_string(),
            parameters: parameter_shape,
        });
        Ok(())
    }
}
