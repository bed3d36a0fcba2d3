use super::*;
use config_mapping::{FailureCause, MappingError, MemberFailure};

#[test]
fn test_invalid_arguments_error_display() {
    let error = Error::InvalidArguments("unknown format 'yaml'".to_string());
    assert_eq!(error.to_string(), "Invalid arguments: unknown format 'yaml'");
}

#[test]
fn test_load_file_error_display() {
    let error = Error::LoadFile {
        path: PathBuf::from("missing.toml"),
        source: io::Error::new(io::ErrorKind::NotFound, "File not found"),
    };
    assert_eq!(
        error.to_string(),
        "Failed to load file 'missing.toml': File not found"
    );
}

#[test]
fn test_mapping_error_is_transparent() {
    let inner = ConfigurationError::BuildFailed(MappingError {
        type_name: "GraphOption".to_string(),
        prefix: "graph".to_string(),
        failures: vec![MemberFailure {
            member: "getTenant".to_string(),
            key: "graph.tenant".to_string(),
            expected: "string".to_string(),
            cause: FailureCause::MissingProperty,
        }],
    });

    let error: Error = inner.clone().into();
    assert_eq!(error.to_string(), inner.to_string());
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
