use graft_util::errors::GraftError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = GraftError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_manifest_error_display() {
    let err = GraftError::Manifest {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Manifest error: bad syntax");
}

#[test]
fn test_config_error_display() {
    let err = GraftError::Config {
        message: "unknown matcher".to_string(),
    };
    assert_eq!(err.to_string(), "Config error: unknown matcher");
}

#[test]
fn test_resolution_error_display() {
    let err = GraftError::Resolution {
        message: "no fixpoint".to_string(),
    };
    assert_eq!(err.to_string(), "Dependency resolution failed: no fixpoint");
}

#[test]
fn test_generic_error_display() {
    let err = GraftError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let graft_err: GraftError = io_err.into();
    assert!(matches!(graft_err, GraftError::Io(_)));
}
