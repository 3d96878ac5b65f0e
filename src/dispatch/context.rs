use std::fmt;
use std::sync::Arc;

use tracing::Span;

use super::ActionError;
use crate::misskey::MisskeyApi;

/// Dependencies an action runs against: the Misskey client and the span its
/// log events are attached to.
///
/// One base context is built at startup. Every call gets its own copy via
/// [`derive`](Self::derive); the base is never modified.
#[derive(Clone)]
pub struct ExecutionContext {
    client: Option<Arc<dyn MisskeyApi>>,
    span: Span,
}

impl ExecutionContext {
    pub fn new(client: Arc<dyn MisskeyApi>, span: Span) -> Self {
        Self {
            client: Some(client),
            span,
        }
    }

    /// A context with no client. Actions that need one fail with
    /// `UninitializedDependency`.
    pub fn without_client(span: Span) -> Self {
        Self { client: None, span }
    }

    /// Per-call context: same client, child span tagged with the action name.
    pub fn derive(&self, action: &str) -> Self {
        Self {
            client: self.client.clone(),
            span: tracing::info_span!(parent: &self.span, "action", action = %action),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self, action: &str) -> Result<&dyn MisskeyApi, ActionError> {
        self.client
            .as_deref()
            .ok_or_else(|| ActionError::UninitializedDependency {
                action: action.to_string(),
            })
    }

    #[cfg(test)]
    pub(crate) fn shares_client_with(&self, other: &ExecutionContext) -> bool {
        match (&self.client, &other.client) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("client", &self.client.as_ref().map(|_| "<misskey>"))
            .field("span", &self.span)
            .finish()
    }
}
