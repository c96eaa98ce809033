use std::io::Write;
use std::sync::Arc;

use postsign::config::ConfigLoader;
use postsign::postsign::build_signer;
use postsign::postsign::clock::SystemClock;
use postsign::postsign::signer::PostSigner;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
address = "127.0.0.1"
port = "9100"
log_level = "warn"
region = "minio"

[credentials]
access_key_id = "minioadmin"
secret_access_key = "minioadmin"

[endpoints]
minio = "storage.example.internal"
"#
    )
    .unwrap();

    let config = ConfigLoader::from_file(file.path()).unwrap();
    ConfigLoader::validate(&config).unwrap();

    assert_eq!(config.port, "9100");
    assert_eq!(config.log_level, "warn");

    let signer = build_signer(&config, Arc::new(SystemClock));
    assert_eq!(
        signer.build_endpoint("uploads").unwrap(),
        "https://uploads.storage.example.internal"
    );
}

#[test]
fn test_example_config_builds_endpoints() {
    let mut config =
        ConfigLoader::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))
            .unwrap();
    ConfigLoader::validate(&config).unwrap();
    assert_eq!(
        build_signer(&config, Arc::new(SystemClock))
            .build_endpoint("uploads")
            .unwrap(),
        "https://uploads.s3.amazonaws.com"
    );

    config.region = "local".to_string();
    ConfigLoader::validate(&config).unwrap();
    assert_eq!(
        build_signer(&config, Arc::new(SystemClock))
            .build_endpoint("uploads")
            .unwrap(),
        "https://uploads.storage.internal:8333"
    );
}

#[test]
fn test_ip_endpoint_fails_validation() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
address = "127.0.0.1"
port = "9100"
region = "local"

[endpoints]
local = "127.0.0.1:8333"
"#
    )
    .unwrap();

    let config = ConfigLoader::from_file(file.path()).unwrap();
    assert!(ConfigLoader::validate(&config).is_err());
    assert!(build_signer(&config, Arc::new(SystemClock))
        .build_endpoint("uploads")
        .is_err());
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::from_file(dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "port = [not valid").unwrap();

    assert!(ConfigLoader::from_file(file.path()).is_err());
}
