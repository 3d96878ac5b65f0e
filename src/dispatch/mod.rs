//! Action dispatch core.
//!
//! An [`Action`] is one named operation with a JSON-schema parameter shape.
//! The [`ActionRegistry`] owns every action by name and, once at startup, binds
//! each of them to a [`ToolHost`](crate::mcp::ToolHost) as a self-contained
//! handler closure. Handlers run against a per-call [`ExecutionContext`].
//!
//! Concrete operations usually implement [`TypedAction`], which declares a
//! serde/schemars parameter struct; the blanket [`Action`] impl decodes the raw
//! argument object into that struct before the body runs.

mod context;
mod registry;

pub use context::ExecutionContext;
pub use registry::{ActionRegistry, RegistryError};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::misskey::MisskeyError;

/// A JSON object: raw tool arguments and parameter schemas.
pub type JsonObject = serde_json::Map<String, Value>;

/// Object-safe action contract used by the registry.
#[async_trait]
pub trait Action: Send + Sync {
    /// Dispatch key and host-visible tool name. Non-empty, unique per registry.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments. A new map on every call.
    fn parameter_shape(&self) -> JsonObject;

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        arguments: JsonObject,
    ) -> Result<ActionOutput, ActionError>;
}

/// An action with a statically known name and parameter type.
#[async_trait]
pub trait TypedAction: Send + Sync + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    type Params: DeserializeOwned + JsonSchema + Send;

    async fn run(
        &self,
        ctx: &ExecutionContext,
        params: Self::Params,
    ) -> Result<ActionOutput, ActionError>;
}

#[async_trait]
impl<T: TypedAction> Action for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn parameter_shape(&self) -> JsonObject {
        parameter_shape::<T::Params>()
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        arguments: JsonObject,
    ) -> Result<ActionOutput, ActionError> {
        let params = decode_arguments::<T::Params>(T::NAME, arguments)?;
        self.run(ctx, params).await
    }
}

/// Generate the schema for `P` from scratch.
pub fn parameter_shape<P: JsonSchema>() -> JsonObject {
    match serde_json::to_value(schemars::schema_for!(P)) {
        Ok(Value::Object(mut map)) => {
            map.remove("$schema");
            map
        }
        _ => JsonObject::new(),
    }
}

pub fn decode_arguments<P: DeserializeOwned>(
    action: &str,
    arguments: JsonObject,
) -> Result<P, ActionError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|source| {
        ActionError::ArgumentDecode {
            action: action.to_string(),
            source,
        }
    })
}

/// Successful result of one action call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub text: String,
}

impl ActionOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Serialize a record set as the output body.
    pub fn records<T: Serialize + ?Sized>(action: &str, records: &T) -> Result<Self, ActionError> {
        serde_json::to_string(records)
            .map(Self::text)
            .map_err(|source| ActionError::Encode {
                action: action.to_string(),
                source,
            })
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid arguments for '{action}': {source}")]
    ArgumentDecode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument for '{action}': {reason}")]
    InvalidArgument { action: String, reason: String },

    #[error("Misskey client is not initialized for action '{action}'")]
    UninitializedDependency { action: String },

    #[error("action '{action}' failed: {source}")]
    Downstream {
        action: String,
        #[source]
        source: MisskeyError,
    },

    #[error("failed to encode result of '{action}': {source}")]
    Encode {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ActionError {
    pub fn downstream(action: &str, source: MisskeyError) -> Self {
        ActionError::Downstream {
            action: action.to_string(),
            source,
        }
    }

    pub fn invalid_argument(action: &str, reason: impl Into<String>) -> Self {
        ActionError::InvalidArgument {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the caller sent arguments the action cannot accept, as
    /// opposed to the action failing while running.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ActionError::ArgumentDecode { .. } | ActionError::InvalidArgument { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back
        message: String,
        #[serde(default)]
        repeat: Option<u32>,
    }

    #[derive(Default)]
    struct Echo {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl TypedAction for Echo {
        const NAME: &'static str = "echo";
        const DESCRIPTION: &'static str = "Echo a message";
        type Params = EchoParams;

        async fn run(
            &self,
            _ctx: &ExecutionContext,
            params: EchoParams,
        ) -> Result<ActionOutput, ActionError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let n = params.repeat.unwrap_or(1) as usize;
            Ok(ActionOutput::text(params.message.repeat(n)))
        }
    }

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn typed_action_decodes_arguments() {
        let echo = Echo::default();
        let ctx = ExecutionContext::without_client(tracing::Span::none());
        let out = Action::execute(&echo, &ctx, object(json!({"message": "ab", "repeat": 2})))
            .await
            .unwrap();
        assert_eq!(out.text, "abab");
        assert_eq!(echo.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decode_failure_never_reaches_body() {
        let echo = Echo::default();
        let ctx = ExecutionContext::without_client(tracing::Span::none());
        let err = Action::execute(&echo, &ctx, object(json!({"message": 7})))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ArgumentDecode { ref action, .. } if action == "echo"));
        assert!(err.is_caller_error());
        assert_eq!(echo.runs.load(Ordering::SeqCst), 0);

        let err = Action::execute(&echo, &ctx, JsonObject::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("message"));
        assert_eq!(echo.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn parameter_shape_describes_fields() {
        let shape = Echo::default().parameter_shape();
        assert_eq!(shape.get("type"), Some(&json!("object")));
        assert_eq!(shape.get("required"), Some(&json!(["message"])));
        let props = shape.get("properties").and_then(Value::as_object).unwrap();
        assert!(props.contains_key("message"));
        assert!(props.contains_key("repeat"));
        assert!(!shape.contains_key("$schema"));
    }

    #[test]
    fn parameter_shape_is_fresh_per_call() {
        let echo = Echo::default();
        let mut first = echo.parameter_shape();
        let second = echo.parameter_shape();
        first.insert("type".into(), json!("string"));
        first.remove("properties");

        assert_eq!(second.get("type"), Some(&json!("object")));
        assert!(second.contains_key("properties"));
        assert_eq!(echo.parameter_shape(), second);
    }

    #[test]
    fn records_render_as_json() {
        let out = ActionOutput::records("list", &[json!({"id": "a"}), json!({"id": "b"})]).unwrap();
        assert_eq!(out.text, r#"[{"id":"a"},{"id":"b"}]"#);
    }
}
