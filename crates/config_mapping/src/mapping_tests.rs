//! Tests for resolved mappings.

use super::*;
use crate::value::CompositeType;

use std::net::IpAddr;

fn member(name: &str, segment: &str, key: &str, value: Value) -> ResolvedMember {
    ResolvedMember {
        name: name.to_string(),
        segment: segment.to_string(),
        key: key.to_string(),
        value,
    }
}

fn server_mapping() -> ResolvedMapping {
    let address = CompositeType::from_str::<IpAddr>("ip-addr")
        .construct("10.0.0.1")
        .expect("valid address");
    ResolvedMapping::new(
        "Server",
        "server",
        vec![
            member(
                "getHost",
                "host",
                "server.host",
                Value::String("localhost".to_string()),
            ),
            member("port", "port", "server.port", Value::Unsigned(8080)),
            member("path", "path", "server.path", Value::Absent),
            member(
                "aliases",
                "aliases",
                "server.aliases",
                Value::List(vec![
                    Value::String("a".to_string()),
                    Value::String("b".to_string()),
                ]),
            ),
            member("bindAddress", "bind-address", "server.bind-address", address),
        ],
    )
}

// ============================================================================
// Accessor Tests
// ============================================================================

/// Verify values can be read by declared name or key segment.
#[test]
fn test_value_lookup() {
    let mapping = server_mapping();

    assert_eq!(mapping.type_name(), "Server");
    assert_eq!(mapping.prefix(), "server");
    assert_eq!(mapping.len(), 5);
    assert!(!mapping.is_empty());
    assert_eq!(mapping.value::<String>("getHost").unwrap(), "localhost");
    assert_eq!(mapping.value::<String>("host").unwrap(), "localhost");
    assert_eq!(mapping.value::<u16>("port").unwrap(), 8080);
    assert_eq!(mapping.value::<Option<String>>("path").unwrap(), None);
    assert_eq!(
        mapping.value::<Vec<String>>("aliases").unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}

/// Verify unknown members and wrong types are reported.
#[test]
fn test_value_errors() {
    let mapping = server_mapping();

    assert_eq!(
        mapping.value::<String>("timeout"),
        Err(ConfigurationError::UnknownMember {
            member: "timeout".to_string()
        })
    );
    assert_eq!(
        mapping.value::<bool>("port"),
        Err(ConfigurationError::TypeMismatch {
            member: "port".to_string(),
            expected: "bool".to_string(),
            actual: "unsigned integer".to_string(),
        })
    );
    assert!(mapping.value::<u8>("port").is_err());
}

/// Verify composite members are borrowed as their constructed type.
#[test]
fn test_composite_access() {
    let mapping = server_mapping();

    let address: &IpAddr = mapping.composite("bind-address").unwrap();
    assert_eq!(address.to_string(), "10.0.0.1");
    assert!(mapping.composite::<String>("bind-address").is_err());
    assert!(mapping.composite::<IpAddr>("port").is_err());
    assert!(mapping.composites::<IpAddr>("aliases").is_err());
}

// ============================================================================
// Encoding Tests
// ============================================================================

/// Verify the snapshot encoding writes indexed sequences and skips absent values.
#[test]
fn test_to_snapshot() {
    let snapshot = server_mapping().to_snapshot();

    assert_eq!(snapshot.get("server.host"), Some("localhost"));
    assert_eq!(snapshot.get("server.port"), Some("8080"));
    assert_eq!(snapshot.get("server.aliases[0]"), Some("a"));
    assert_eq!(snapshot.get("server.aliases[1]"), Some("b"));
    assert_eq!(snapshot.get("server.bind-address"), Some("10.0.0.1"));
    assert!(!snapshot.contains_key("server.path"));
    assert_eq!(snapshot.len(), 5);
}

/// Verify nested groups are encoded under their own keys.
#[test]
fn test_to_snapshot_nested_group() {
    let tls = ResolvedMapping::new(
        "Server.tls",
        "server.tls",
        vec![member("enabled", "enabled", "server.tls.enabled", Value::Bool(true))],
    );
    let mapping = ResolvedMapping::new(
        "Server",
        "server",
        vec![member("tls", "tls", "server.tls", Value::Group(tls))],
    );

    let snapshot = mapping.to_snapshot();
    assert_eq!(snapshot.get("server.tls.enabled"), Some("true"));
    assert_eq!(snapshot.len(), 1);
}

/// Verify the JSON rendering is keyed by segment.
#[test]
fn test_to_json() {
    let json = server_mapping().to_json();

    assert_eq!(json["host"], "localhost");
    assert_eq!(json["port"], 8080);
    assert!(json["path"].is_null());
    assert_eq!(json["aliases"], serde_json::json!(["a", "b"]));
    assert_eq!(json["bind-address"], "10.0.0.1");
}

/// Verify clones share data and compare equal.
#[test]
fn test_clone_equality() {
    let mapping = server_mapping();
    let clone = mapping.clone();

    assert_eq!(mapping, clone);
    assert_ne!(mapping, ResolvedMapping::new("Server", "server", vec![]));
}
