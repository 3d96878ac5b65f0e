/*!
`serve` subcommand (the default): run the MCP server.

Startup order:
  1. resolve the instance config (CLI > env)
  2. build the Misskey client, or continue without one
  3. register every action, bind them to the rmcp host
  4. serve over stdio until the client disconnects

Without an instance the server still starts and lists its tools; every
call then fails with an "uninitialized dependency" error result.
*/

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::sync::Arc;
use tracing::{Span, info, info_span, warn};

use crate::actions::build_registry;
use crate::config::{ClientConfig, ConfigError, ConfigSources};
use crate::dispatch::ExecutionContext;
use crate::mcp::McpToolServer;
use crate::misskey::{MisskeyApi, MisskeyClient};

const INSTRUCTIONS: &str = "Tools for a Misskey instance: post notes, search notes and read a user's timeline. \
Note and user IDs are Misskey object IDs.";

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    #[default]
    Stdio,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Transport to serve MCP on
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Misskey instance URL, e.g. https://misskey.io (overrides MISSKEY_URL)
    #[arg(long, value_name = "URL")]
    pub instance: Option<String>,

    /// HTTP timeout for Misskey requests, in seconds (at least 1)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl ServeArgs {
    fn sources(&self, mut env: ConfigSources) -> ConfigSources {
        if let Some(instance) = self.instance.as_ref().filter(|s| !s.trim().is_empty()) {
            env.url = Some(instance.clone());
        }
        if self.timeout.is_some() {
            env.timeout_secs = self.timeout;
        }
        env
    }
}

pub fn execute_serve(args: ServeArgs) -> Result<()> {
    let span = info_span!("server");
    let ctx = {
        let _guard = span.enter();
        base_context(args.sources(ConfigSources::from_env()), span.clone())?
    };

    let registry = build_registry(&span).context("Failed to build action registry")?;
    info!(
        parent: &span,
        actions = registry.len(),
        names = ?registry.names().collect::<Vec<_>>(),
        client = ctx.has_client(),
        "registry ready"
    );
    let mut server = McpToolServer::new().with_instructions(INSTRUCTIONS);
    registry
        .bind_all(&mut server, &ctx)
        .context("Failed to register tools with the MCP host")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    match args.transport {
        Transport::Stdio => rt.block_on(server.serve_stdio()),
    }
}

/// The context every handler starts from. A missing instance is not fatal;
/// a malformed one is.
fn base_context(sources: ConfigSources, span: Span) -> Result<ExecutionContext> {
    let config = match ClientConfig::resolve(sources) {
        Ok(config) => config,
        Err(ConfigError::MissingInstance) => {
            warn!("no Misskey instance configured; tool calls will fail until one is set");
            return Ok(ExecutionContext::without_client(span));
        }
        Err(e) => return Err(e).context("Invalid Misskey configuration"),
    };
    if config.token.is_none() {
        warn!("MISSKEY_API_TOKEN is not set; authenticated endpoints will be rejected");
    }

    let client = MisskeyClient::new(&config).context("Failed to build Misskey HTTP client")?;
    info!(instance = %client.base_url(), "Misskey client ready");
    let client: Arc<dyn MisskeyApi> = Arc::new(client);
    Ok(ExecutionContext::new(client, span))
}
