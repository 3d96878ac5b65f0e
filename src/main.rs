use anyhow::Result;
use clap::{Parser, Subcommand};

mod actions;
mod cmd;
mod config;
mod dispatch;
mod mcp;
mod misskey;
mod utils;

use cmd::{ServeArgs, ToolsArgs};
use utils::LogLevel;

/// MCP server exposing Misskey actions as tools.
///
///   misskey-mcp-server                 serve over stdio (same as `serve`)
///   misskey-mcp-server serve --instance https://misskey.io
///   misskey-mcp-server tools --format json
///
/// Environment:
///   MISSKEY_URL          instance root URL
///   MISSKEY_PROTOCOL     used with MISSKEY_DOMAIN when MISSKEY_URL is unset (default https)
///   MISSKEY_DOMAIN       instance host name
///   MISSKEY_PATH         optional path prefix under the domain
///   MISSKEY_API_TOKEN    access token sent as `i`
///   RUST_LOG             tracing filter, replaces the -v / -q level
///
/// Logs always go to stderr; stdout carries the MCP stream.
#[derive(Parser, Debug)]
#[command(
    name = "misskey-mcp-server",
    version,
    about = "MCP server for Misskey",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit log level (overrides -v / -q)
    #[arg(long, value_enum, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the Misskey tools over MCP
    Serve(ServeArgs),

    /// Print the tools the server exposes
    Tools(ToolsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.log_level, cli.verbose, cli.quiet);
    utils::init_logging(level)?;

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => cmd::execute_serve(args),
        Commands::Tools(args) => cmd::execute_tools(args),
    }
}
