use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tracing::{Instrument, Span, debug, error, info};

use super::{Action, ExecutionContext, JsonObject};
use crate::mcp::{HostError, ToolHandler, ToolHost};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("action name must not be empty")]
    EmptyName,

    #[error("action '{name}' is already registered")]
    DuplicateAction { name: String },

    #[error("failed to bind action '{name}': {cause}")]
    Bind {
        name: String,
        #[source]
        cause: HostError,
    },
}

/// Name-keyed set of actions.
///
/// Filled during startup, then bound to a host once with [`bind_all`](Self::bind_all).
/// Entries are kept sorted by name, so iteration order is deterministic.
pub struct ActionRegistry {
    entries: BTreeMap<String, Arc<dyn Action>>,
    span: Span,
}

impl ActionRegistry {
    pub fn new(parent: &Span) -> Self {
        Self {
            entries: BTreeMap::new(),
            span: tracing::info_span!(parent: parent, "registry", component = "action_registry"),
        }
    }

    /// Add an action. Fails without touching the registry if the name is
    /// empty or already taken.
    pub fn register(&mut self, action: Arc<dyn Action>) -> Result<(), RegistryError> {
        let _entered = self.span.enter();
        let name = action.name().to_string();
        if name.is_empty() {
            error!("refusing to register an action with an empty name");
            return Err(RegistryError::EmptyName);
        }
        match self.entries.entry(name) {
            Entry::Occupied(existing) => {
                error!(action = %existing.key(), "action already registered");
                Err(RegistryError::DuplicateAction {
                    name: existing.key().clone(),
                })
            }
            Entry::Vacant(slot) => {
                info!(action = %slot.key(), "action registered");
                slot.insert(action);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.entries.get(name).map(|a| a.as_ref())
    }

    /// Register one handler per action with `host`.
    ///
    /// Stops at the first host rejection. Entries bound before it stay bound;
    /// hosts have no way to unregister.
    pub fn bind_all<H: ToolHost + ?Sized>(
        &self,
        host: &mut H,
        base: &ExecutionContext,
    ) -> Result<(), RegistryError> {
        let _entered = self.span.enter();
        if self.entries.is_empty() {
            info!("no actions registered; nothing to bind");
            return Ok(());
        }

        info!(count = self.entries.len(), "binding actions to tool host");
        for (name, action) in &self.entries {
            let handler = make_handler(Arc::clone(action), name.clone(), base.clone());
            if let Err(cause) = host.register_operation(
                name,
                action.description(),
                handler,
                action.parameter_shape(),
            ) {
                error!(action = %name, error = %cause, "tool host rejected action");
                return Err(RegistryError::Bind {
                    name: name.clone(),
                    cause,
                });
            }
            debug!(action = %name, "action bound");
        }
        info!("all actions bound");
        Ok(())
    }
}

/// Build the handler for exactly one action. Everything the closure needs is
/// moved in here, so each handler owns its own action, name and base context.
fn make_handler(action: Arc<dyn Action>, name: String, base: ExecutionContext) -> ToolHandler {
    Arc::new(move |arguments: JsonObject| {
        let action = Arc::clone(&action);
        let ctx = base.derive(&name);
        let span = ctx.span().clone();
        async move {
            debug!("executing action");
            let result = action.execute(&ctx, arguments).await;
            match &result {
                Ok(_) => info!("action completed"),
                Err(err) => error!(error = %err, "action failed"),
            }
            result
        }
        .instrument(span)
        .boxed()
    })
}
