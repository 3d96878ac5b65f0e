//! Concrete Misskey actions.
//!
//! Adding an operation means one new `TypedAction` type and one line in
//! [`default_actions`].

mod notes;
mod users;

pub use notes::{PostNoteAction, SearchNotesAction};
pub use users::GetUserNotesAction;

use std::sync::Arc;
use tracing::Span;

use crate::dispatch::{Action, ActionError, ActionRegistry, RegistryError};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Every action this server exposes.
pub fn default_actions() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(PostNoteAction) as Arc<dyn Action>,
        Arc::new(SearchNotesAction) as Arc<dyn Action>,
        Arc::new(GetUserNotesAction) as Arc<dyn Action>,
    ]
}

/// A registry holding [`default_actions`].
pub fn build_registry(parent: &Span) -> Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new(parent);
    for action in default_actions() {
        registry.register(action)?;
    }
    Ok(registry)
}

pub(crate) fn require_non_blank(
    action: &str,
    field: &str,
    value: String,
) -> Result<String, ActionError> {
    if value.trim().is_empty() {
        return Err(ActionError::invalid_argument(
            action,
            format!("'{field}' must not be blank"),
        ));
    }
    Ok(value)
}

pub(crate) fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
