/*!
`tools` subcommand: print the tools the server would expose.

Binds the same registry `serve` uses to a catalog host, so the listing
always matches what an MCP client sees in `tools/list`. No instance
configuration or network access is needed.

JSON / YAML shape:
  [ { "name": "...", "description": "...", "parameters": { <JSON schema> } } ]
*/

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::io::IsTerminal;
use tracing::Span;

use crate::actions::build_registry;
use crate::cmd::format::{Role, StyleOptions, color, emoji, table};
use crate::dispatch::ExecutionContext;
use crate::mcp::{CatalogEntry, ToolCatalog};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Args, Debug, Default)]
pub struct ToolsArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute_tools(args: ToolsArgs) -> Result<()> {
    let catalog = collect_catalog()?;
    let out = render(catalog.entries(), args.format, &output_style())?;
    println!("{out}");
    Ok(())
}

fn output_style() -> StyleOptions {
    let detected = StyleOptions::detect();
    if std::io::stdout().is_terminal() {
        detected
    } else {
        StyleOptions::plain(detected.term_width)
    }
}

fn collect_catalog() -> Result<ToolCatalog> {
    let span = Span::current();
    let registry = build_registry(&span).context("Failed to build action registry")?;
    let mut catalog = ToolCatalog::default();
    registry
        .bind_all(&mut catalog, &ExecutionContext::without_client(span))
        .context("Failed to bind actions to the catalog")?;
    Ok(catalog)
}

fn render(entries: &[CatalogEntry], format: OutputFormat, style: &StyleOptions) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(entries).context("Failed to encode tools as JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(entries)
            .map(|s| s.trim_end().to_string())
            .context("Failed to encode tools as YAML"),
        OutputFormat::Table => Ok(render_table(entries, style)),
    }
}

fn render_table(entries: &[CatalogEntry], style: &StyleOptions) -> String {
    let title = color(
        Role::Title,
        format!("{}Tools ({})", emoji("tool", style), entries.len()),
        style,
    );
    if entries.is_empty() {
        return format!("{title}\n{}", color(Role::Dim, "(none)", style));
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            let params = entry
                .parameter_summary()
                .into_iter()
                .map(|(name, ty, required)| {
                    let marker = if required { "*" } else { "" };
                    format!("{name}{marker}:{ty}")
                })
                .collect::<Vec<_>>();
            vec![
                entry.name.clone(),
                if params.is_empty() {
                    "-".to_string()
                } else {
                    params.join(", ")
                },
                entry.description.replace('\n', " "),
            ]
        })
        .collect();

    format!(
        "{title}\n\n{}\n\n{}",
        table(&["NAME", "PARAMS", "DESCRIPTION"], &rows, style),
        color(Role::Dim, "* required", style)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::Value;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: ToolsArgs,
    }

    #[test]
    fn clap_parses_format() {
        let cli = TestCli::try_parse_from(["t"]).unwrap();
        assert_eq!(cli.args.format, OutputFormat::Table);
        let cli = TestCli::try_parse_from(["t", "--format", "yaml"]).unwrap();
        assert_eq!(cli.args.format, OutputFormat::Yaml);
        assert!(TestCli::try_parse_from(["t", "--format", "xml"]).is_err());
    }

    #[test]
    fn catalog_lists_every_action() {
        let catalog = collect_catalog().unwrap();
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_misskey_user_notes",
                "post_misskey_note",
                "search_misskey_notes"
            ]
        );
    }

    #[test]
    fn json_output_carries_schemas() {
        let catalog = collect_catalog().unwrap();
        let out = render(catalog.entries(), OutputFormat::Json, &StyleOptions::plain(100)).unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        let post = v
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "post_misskey_note")
            .unwrap();
        assert_eq!(post["description"], "Post a note to Misskey");
        assert_eq!(post["parameters"]["type"], "object");
        assert!(post["parameters"]["properties"].get("text").is_some());
    }

    #[test]
    fn yaml_output_parses_back() {
        let catalog = collect_catalog().unwrap();
        let out = render(catalog.entries(), OutputFormat::Yaml, &StyleOptions::plain(100)).unwrap();
        let v: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(v.as_sequence().map(|s| s.len()), Some(3));
    }

    #[test]
    fn table_marks_required_parameters() {
        let catalog = collect_catalog().unwrap();
        let out = render(catalog.entries(), OutputFormat::Table, &StyleOptions::plain(200)).unwrap();
        assert!(out.starts_with("Tools (3)"));
        assert!(out.contains("text*:string"));
        assert!(out.contains("userId*:string"));
        assert!(out.contains("Post a note to Misskey"));
    }

    #[test]
    fn captured_stdout_gets_plain_style() {
        // only checkable when the test run itself is piped
        if std::io::stdout().is_terminal() {
            return;
        }
        let style = output_style();
        assert!(!style.use_color);
        assert!(!style.use_emoji);
    }

    #[test]
    fn empty_table() {
        let out = render(&[], OutputFormat::Table, &StyleOptions::plain(80)).unwrap();
        assert_eq!(out, "Tools (0)\n(none)");
    }
}
