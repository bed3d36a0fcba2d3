//! Tests for the keys command.

use super::*;

use std::fs;

const DECLARATION: &str = r#"
type_name = "Server"
prefix = "server"

[[member]]
name = "getHost"

[[member]]
name = "port"
type = "u16"
default = "8080"

[[member]]
name = "aliases"
shape = "sequence"

[[member]]
name = "tls"
type = "group"

[[member.member]]
name = "certPath"
shape = "optional"
"#;

fn write_declaration(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("server.toml");
    fs::write(&path, DECLARATION).unwrap();
    path
}

/// Verify keys are listed with type and requirement under the declared prefix.
#[test]
fn test_keys_lists_declared_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let args = KeysArgs {
        mapping: write_declaration(&dir),
        prefix: None,
    };

    let output = execute(&args).unwrap();

    assert_eq!(
        output,
        "server.host (string, required)\n\
         server.port (u16, optional)\n\
         server.aliases (list of string, required)\n\
         server.tls.cert-path (optional string, optional)"
    );
}

/// Verify an explicit prefix replaces the declared one.
#[test]
fn test_keys_with_prefix_override() {
    let dir = tempfile::tempdir().unwrap();
    let args = KeysArgs {
        mapping: write_declaration(&dir),
        prefix: Some(String::new()),
    };

    let output = execute(&args).unwrap();

    assert!(output.starts_with("host (string, required)"));
    assert!(output.contains("tls.cert-path"));
}

/// Verify map and group sequence keys are listed with placeholders.
#[test]
fn test_keys_lists_maps_and_group_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cluster.toml");
    fs::write(
        &path,
        r#"
type_name = "Cluster"
prefix = "cluster"

[[member]]
name = "labels"
shape = "map"

[[member]]
name = "nodes"
type = "group"
shape = "sequence"

[[member.member]]
name = "host"
"#,
    )
    .unwrap();
    let args = KeysArgs {
        mapping: path,
        prefix: None,
    };

    let output = execute(&args).unwrap();

    assert_eq!(
        output,
        "cluster.labels.* (map of string, optional)\n\
         cluster.nodes[*].host (string, required)"
    );
}
