//! Keys command for the config-map CLI.
//!
//! Lists every property key a declared mapping reads, with its type and
//! whether it must be configured.

use std::path::PathBuf;

use clap::Args;
use config_mapping::{join_key, MappingDescriptor, MemberKind};
use tracing::instrument;

use crate::commands::load_declaration;
use crate::errors::Error;

#[cfg(test)]
#[path = "keys_cmd_tests.rs"]
mod tests;

/// Arguments of the `keys` command.
#[derive(Args, Debug, Clone)]
pub struct KeysArgs {
    /// Mapping declaration file (TOML).
    #[arg(long)]
    pub mapping: PathBuf,

    /// Prefix to list keys under. Defaults to the declared prefix.
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Executes the keys command and returns one line per key.
///
/// # Errors
///
/// Returns an error if the declaration cannot be read, parsed or converted.
#[instrument(skip_all, fields(mapping = %args.mapping.display()))]
pub fn execute(args: &KeysArgs) -> Result<String, Error> {
    let (declaration, descriptor) = load_declaration(&args.mapping)?;
    let prefix = args.prefix.as_deref().unwrap_or(&declaration.prefix);

    let mut lines = Vec::new();
    describe_keys(&descriptor, prefix, &mut lines);
    Ok(lines.join("\n"))
}

fn describe_keys(descriptor: &MappingDescriptor, prefix: &str, lines: &mut Vec<String>) {
    for member in descriptor.members() {
        let key = join_key(prefix, member.key());
        match member.kind() {
            MemberKind::Group(group) => describe_keys(group, &key, lines),
            MemberKind::GroupSequence(group) | MemberKind::OptionalGroupSequence(group) => {
                describe_keys(group, &format!("{}[*]", key), lines)
            }
            MemberKind::GroupMap(group) => describe_keys(group, &join_key(&key, "*"), lines),
            MemberKind::Map(_) => lines.push(format!(
                "{} ({}, optional)",
                join_key(&key, "*"),
                member.kind().type_name()
            )),
            kind => {
                let status = if member.is_required() {
                    "required"
                } else {
                    "optional"
                };
                lines.push(format!("{} ({}, {})", key, kind.type_name(), status));
            }
        }
    }
}
