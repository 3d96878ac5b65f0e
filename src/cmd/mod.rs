/*!
Subcommands.

  serve  run the MCP server over stdio (default when no subcommand is given)
  tools  print the tool catalog the server exposes

Each subcommand module exposes one `execute_*` function returning
`anyhow::Result<()>` and a `clap::Args` struct.
*/

pub mod format;
pub mod serve;
pub mod tools;

pub use serve::{ServeArgs, execute_serve};
pub use tools::{ToolsArgs, execute_tools};
