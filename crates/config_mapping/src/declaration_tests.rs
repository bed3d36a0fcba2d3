//! Tests for declarative mapping definitions.

use super::*;
use crate::engine::MappingEngine;
use crate::mapping::ResolvedMapping;
use crate::snapshot::PropertySnapshot;
use crate::value::Value;

use std::collections::BTreeMap;

const GRAPH_DECLARATION: &str = r#"
type_name = "GraphOption"
prefix = "graph"

[[member]]
name = "getBaseUrl"
default = "https://graph.example.com"

[[member]]
name = "getClientId"

[[member]]
name = "scopes"
shape = "sequence"
default = "openid,profile"

[[member]]
name = "tokenUrl"
default_expr = "${base-url}/token"

[[member]]
name = "bindAddress"
type = "ip-addr"
shape = "optional"
"#;

// ============================================================================
// Parsing Tests
// ============================================================================

/// Verify a declaration parses with defaults for omitted fields.
#[test]
fn test_parse_declaration() {
    let declaration = MappingDeclaration::from_toml_str(GRAPH_DECLARATION).unwrap();

    assert_eq!(declaration.type_name, "GraphOption");
    assert_eq!(declaration.prefix, "graph");
    assert_eq!(declaration.naming_strategy, NamingStrategy::KebabCase);
    assert_eq!(declaration.members.len(), 5);
    assert_eq!(declaration.members[0].value_type, "string");
    assert_eq!(declaration.members[2].shape, MemberShape::Sequence);
    assert_eq!(declaration.members[4].shape, MemberShape::Optional);
}

/// Verify unknown fields are rejected.
#[test]
fn test_parse_rejects_unknown_fields() {
    let result = MappingDeclaration::from_toml_str(
        r#"
type_name = "T"

[[member]]
name = "a"
required = true
"#,
    );

    assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
}

/// Verify the naming strategy can be chosen in the declaration.
#[test]
fn test_parse_naming_strategy() {
    let declaration = MappingDeclaration::from_toml_str(
        r#"
type_name = "T"
naming_strategy = "snake-case"

[[member]]
name = "clientId"
"#,
    )
    .unwrap();

    let descriptor = declaration.to_descriptor(&TypeRegistry::new()).unwrap();
    assert_eq!(descriptor.members()[0].key(), "client_id");
}

// ============================================================================
// Conversion Tests
// ============================================================================

/// Verify a converted declaration resolves like a hand-built descriptor.
#[test]
fn test_declaration_resolves() {
    let descriptor = MappingDeclaration::from_toml_str(GRAPH_DECLARATION)
        .unwrap()
        .to_descriptor(&TypeRegistry::with_builtins())
        .unwrap();
    let snapshot = PropertySnapshot::new().with("graph.client-id", "id");

    let mapping = MappingEngine::new()
        .build(&descriptor, "graph", &snapshot)
        .unwrap();

    assert_eq!(
        mapping.value::<String>("tokenUrl").unwrap(),
        "https://graph.example.com/token"
    );
    assert_eq!(
        mapping.value::<Vec<String>>("scopes").unwrap(),
        vec!["openid".to_string(), "profile".to_string()]
    );
    assert_eq!(mapping.get("bindAddress"), Some(&Value::Absent));
}

/// Verify nested groups become group members.
#[test]
fn test_group_declaration() {
    let declaration = MappingDeclaration::from_toml_str(
        r#"
type_name = "Server"
prefix = "server"

[[member]]
name = "host"

[[member]]
name = "tls"
type = "group"

[[member.member]]
name = "enabled"
type = "bool"
default = "false"
"#,
    )
    .unwrap();

    let descriptor = declaration.to_descriptor(&TypeRegistry::new()).unwrap();

    match descriptor.members()[1].kind() {
        MemberKind::Group(group) => {
            assert_eq!(group.type_name(), "Server.tls");
            assert_eq!(group.members()[0].key(), "enabled");
        }
        other => panic!("Expected a group member, got {:?}", other),
    }
    assert_eq!(descriptor.keys("server"), vec!["server.host", "server.tls.enabled"]);
}

/// Verify group sequences, maps and optional sequences can be declared and resolve.
#[test]
fn test_collection_shapes_declaration() {
    let content = r#"
type_name = "Cluster"
prefix = "cluster"

[[member]]
name = "labels"
shape = "map"

[[member]]
name = "tags"
shape = "optional-sequence"

[[member]]
name = "nodes"
type = "group"
shape = "sequence"

[[member.member]]
name = "host"

[[member.member]]
name = "port"
type = "u16"
default = "80"

[[member]]
name = "zones"
type = "group"
shape = "map"

[[member.member]]
name = "region"
"#;
    let descriptor = MappingDeclaration::from_toml_str(content)
        .unwrap()
        .to_descriptor(&TypeRegistry::new())
        .unwrap();

    assert!(matches!(descriptor.members()[0].kind(), MemberKind::Map(_)));
    assert!(matches!(
        descriptor.members()[1].kind(),
        MemberKind::OptionalSequence(_)
    ));
    assert!(matches!(
        descriptor.members()[2].kind(),
        MemberKind::GroupSequence(_)
    ));
    assert!(matches!(descriptor.members()[3].kind(), MemberKind::GroupMap(_)));
    assert_eq!(
        descriptor.keys("cluster"),
        vec![
            "cluster.labels.*",
            "cluster.tags",
            "cluster.nodes[*].host",
            "cluster.nodes[*].port",
            "cluster.zones.*.region",
        ]
    );

    let snapshot = PropertySnapshot::new()
        .with("cluster.labels.team", "core")
        .with("cluster.nodes[0].host", "a")
        .with("cluster.nodes[1].host", "b")
        .with("cluster.nodes[1].port", "8080")
        .with("cluster.zones.west.region", "us-west");
    let mapping = MappingEngine::new()
        .build(&descriptor, "cluster", &snapshot)
        .unwrap();

    assert_eq!(mapping.get("tags"), Some(&Value::Absent));
    let nodes: Vec<ResolvedMapping> = mapping.value("nodes").unwrap();
    assert_eq!(nodes[0].value::<u16>("port").unwrap(), 80);
    assert_eq!(nodes[1].value::<u16>("port").unwrap(), 8080);
    let zones: BTreeMap<String, ResolvedMapping> = mapping.value("zones").unwrap();
    assert_eq!(zones["west"].value::<String>("region").unwrap(), "us-west");
}

/// Verify invalid member declarations are rejected.
#[test]
fn test_invalid_member_declarations() {
    let cases = [
        (
            "unknown type",
            r#"
type_name = "T"
[[member]]
name = "id"
type = "uuid"
"#,
        ),
        (
            "both defaults",
            r#"
type_name = "T"
[[member]]
name = "url"
default = "a"
default_expr = "${b}"
"#,
        ),
        (
            "empty group",
            r#"
type_name = "T"
[[member]]
name = "tls"
type = "group"
"#,
        ),
        (
            "optional group",
            r#"
type_name = "T"
[[member]]
name = "tls"
type = "group"
shape = "optional"
[[member.member]]
name = "enabled"
"#,
        ),
        (
            "nested members on a scalar",
            r#"
type_name = "T"
[[member]]
name = "host"
[[member.member]]
name = "enabled"
"#,
        ),
    ];

    for (case, content) in cases {
        let declaration = MappingDeclaration::from_toml_str(content).unwrap();
        let result = declaration.to_descriptor(&TypeRegistry::with_builtins());
        assert!(
            matches!(result, Err(ConfigurationError::InvalidDeclaration { .. })),
            "{} should be rejected, got {:?}",
            case,
            result
        );
    }
}

/// Verify custom composites can be registered by name.
#[test]
fn test_type_registry() {
    let registry = TypeRegistry::with_builtins()
        .with(CompositeType::new("upper", |raw: &str| {
            Ok::<_, String>(raw.to_uppercase())
        }));

    assert!(matches!(
        registry.resolve("u16"),
        Some(ValueType::Scalar(ScalarType::U16))
    ));
    assert_eq!(registry.resolve("socket-addr").unwrap().name(), "socket-addr");
    assert_eq!(registry.resolve("upper").unwrap().name(), "upper");
    assert!(registry.resolve("uuid").is_none());
}
