//! Resolve command for the config-map CLI.
//!
//! Builds a declared mapping from a TOML properties file plus `--set`
//! overrides and prints the resolved values.
//!
//! # Examples
//!
//! ```bash
//! config-map resolve --mapping graph.toml --properties app.toml \
//!     --set graph.client-id=abc --format json
//! ```

use std::path::PathBuf;

use clap::Args;
use config_mapping::{MappingEngine, PropertySnapshot, ResolvedMapping, Value};
use tracing::{debug, instrument};

use crate::commands::{load_declaration, parse_key_val, read_file};
use crate::errors::Error;

#[cfg(test)]
#[path = "resolve_cmd_tests.rs"]
mod tests;

/// Arguments of the `resolve` command.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Mapping declaration file (TOML).
    #[arg(long)]
    pub mapping: PathBuf,

    /// Properties file (TOML). Tables become dotted keys.
    #[arg(long)]
    pub properties: Option<PathBuf>,

    /// Prefix to resolve under. Defaults to the declared prefix.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Property override, applied after the properties file.
    #[arg(long = "set", value_parser = parse_key_val)]
    pub overrides: Vec<(String, String)>,

    /// Output format (text or json).
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Executes the resolve command and returns the rendered mapping.
///
/// # Errors
///
/// This function will return an error if:
/// - The declaration or properties file cannot be read or parsed
/// - The declaration is invalid
/// - Any member of the mapping fails to resolve
/// - The output format is unknown
#[instrument(skip_all, fields(mapping = %args.mapping.display()))]
pub fn execute(args: &ResolveArgs) -> Result<String, Error> {
    if args.format != "text" && args.format != "json" {
        return Err(Error::InvalidArguments(format!(
            "unknown format '{}', expected 'text' or 'json'",
            args.format
        )));
    }

    let (declaration, descriptor) = load_declaration(&args.mapping)?;
    let prefix = args.prefix.as_deref().unwrap_or(&declaration.prefix);

    let mut snapshot = match &args.properties {
        Some(path) => PropertySnapshot::from_toml_str(&read_file(path)?)?,
        None => PropertySnapshot::new(),
    };
    for (key, value) in &args.overrides {
        snapshot = snapshot.with(key.clone(), value.clone());
    }
    debug!(properties = snapshot.len(), prefix, "Resolving mapping");

    let mapping = MappingEngine::new()
        .build(&descriptor, prefix, &snapshot)
        .map_err(config_mapping::ConfigurationError::from)?;

    match args.format.as_str() {
        "json" => serde_json::to_string_pretty(&mapping.to_json())
            .map_err(|e| Error::Output(e.to_string())),
        _ => Ok(render_text(&mapping)),
    }
}

/// Renders one `key = value` line per leaf member.
pub fn render_text(mapping: &ResolvedMapping) -> String {
    let mut lines = Vec::new();
    collect_lines(mapping, &mut lines);
    lines.join("\n")
}

fn collect_lines(mapping: &ResolvedMapping, lines: &mut Vec<String>) {
    for member in mapping.members() {
        match &member.value {
            Value::Group(group) => collect_lines(group, lines),
            Value::List(items) if items.iter().any(|item| matches!(item, Value::Group(_))) => {
                for item in items {
                    if let Value::Group(group) = item {
                        collect_lines(group, lines);
                    }
                }
            }
            Value::Map(entries) => {
                for (name, value) in entries {
                    match value {
                        Value::Group(group) => collect_lines(group, lines),
                        value => lines.push(format!(
                            "{}.{} = {}",
                            member.key,
                            name,
                            render_value(value)
                        )),
                    }
                }
            }
            value => lines.push(format!("{} = {}", member.key, render_value(value))),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Absent => "<absent>".to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_raw().unwrap_or_default(),
    }
}
