//! Shared CLI definitions for ciband.
//!
//! Used by the main binary and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Which chart generation's shape requirements to validate against.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GenerationArg {
    /// d3-era requirements: at least one dimension, no measure check
    Classic,
    /// Chart-library requirements: at least one dimension and three measures
    Declarative,
}

/// How unset field selections are handled.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FieldPolicyArg {
    /// Fail the render pass when any field is unset
    Strict,
    /// Default unset fields to the first dimension and first three measures
    Lenient,
}

/// Format of a visualization settings file given with `--config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// Detect format from path extension. Anything that is not `.toml` is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Command-line arguments for ciband
#[derive(Clone, Parser, Debug)]
#[command(
    name = "ciband",
    version,
    about = "Prepare confidence-interval line chart data from a BI query result",
    long_about = "Reads a render request (query fields, rows and visualization settings) as JSON, \
                  validates it, resolves the chart fields and prints the plot points, groups, \
                  axis and series configuration as JSON."
)]
pub struct Args {
    /// Path to the render request JSON ({"fields": ..., "data": [...], "config": {...}}).
    /// Not required with --generate-config.
    #[arg(required_unless_present = "generate_config", value_name = "REQUEST")]
    pub request: Option<PathBuf>,

    /// Visualization settings file (JSON, or TOML when the extension is .toml).
    /// Values in this file override the request's "config" object.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fail when any chart field is unset instead of defaulting it (overrides config [fields] policy)
    #[arg(long = "strict", action, conflicts_with = "field_policy")]
    pub strict: bool,

    /// Field policy (strict or lenient). Overrides config [fields] policy.
    #[arg(long = "field-policy", value_enum)]
    pub field_policy: Option<FieldPolicyArg>,

    /// Shape requirements to validate against (classic or declarative). Overrides config [validation] generation.
    #[arg(long = "generation", value_enum)]
    pub generation: Option<GenerationArg>,

    /// Pretty-print the JSON output
    #[arg(long = "pretty", action)]
    pub pretty: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/ciband/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// Field policy requested on the command line, if any. `--strict` is shorthand for `--field-policy strict`.
    pub fn requested_field_policy(&self) -> Option<FieldPolicyArg> {
        if self.strict {
            Some(FieldPolicyArg::Strict)
        } else {
            self.field_policy
        }
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = if arg.is_positional() || arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };

        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
