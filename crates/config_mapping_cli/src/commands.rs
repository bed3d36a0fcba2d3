//! Command modules for the config-map CLI.
//!
//! - `resolve_cmd`: builds a declared mapping from properties and prints it
//! - `keys_cmd`: lists the property keys a declared mapping reads

use std::fs;
use std::path::Path;

use config_mapping::{MappingDeclaration, MappingDescriptor, TypeRegistry};
use tracing::debug;

use crate::errors::Error;

pub mod keys_cmd;
pub mod resolve_cmd;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Parses a `KEY=VALUE` argument. Everything after the first `=` is the value.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

pub(crate) fn read_file(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::LoadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a mapping declaration and converts it with the built-in composite types.
pub(crate) fn load_declaration(
    path: &Path,
) -> Result<(MappingDeclaration, MappingDescriptor), Error> {
    debug!(path = %path.display(), "Loading mapping declaration");
    let declaration = MappingDeclaration::from_toml_str(&read_file(path)?)?;
    let descriptor = declaration.to_descriptor(&TypeRegistry::with_builtins())?;
    Ok((declaration, descriptor))
}
