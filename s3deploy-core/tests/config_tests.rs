//! Config file loading error-message and resolution integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use s3deploy_core::{
    config::{self, DeployConfig},
    types::{DeploymentName, ProductName},
    ValidationError,
};

const VALID: &str = "\
general:
  products: webapp
  deployments: staging production
  s3_bucket: site-assets
  region: eu-west-1
cloudfront-webapp:
  staging-dist-id: ESTAGING
  production-dist-id: EPROD
aws-credentials:
  access_id: id
  secret_key: secret
";

fn no_env(_: &str) -> Option<String> {
    None
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("s3-deploy.yaml");
    let err = config::load_at(&path).unwrap_err();
    assert!(matches!(err, ValidationError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("s3-deploy.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("s3-deploy.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ValidationError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("s3-deploy.yaml"));
}

#[test]
fn load_list_document_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("s3-deploy.yaml");
    file.write_str("- this is a list, not sections\n").expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ValidationError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Resolution
// ---------------------------------------------------------------------------

#[test]
fn valid_file_resolves_every_setting() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("s3-deploy.yaml");
    file.write_str(VALID).expect("write");
    file.assert(predicate::str::contains("site-assets"));

    let loaded = config::load_at(file.path()).expect("load");
    let resolved = DeployConfig::resolve(loaded, no_env).expect("resolve");
    assert_eq!(resolved.bucket, "site-assets");
    assert_eq!(resolved.region, "eu-west-1");
    assert_eq!(resolved.deployments.len(), 2);

    let target = resolved
        .target(&ProductName::from("webapp"), &DeploymentName::from("production"))
        .expect("target");
    assert_eq!(target.distribution_id, "EPROD");
    assert_eq!(target.bucket, "site-assets");
}

#[test]
fn unknown_deployment_is_rejected() {
    let resolved = DeployConfig::resolve(
        config::ConfigFile::parse(VALID).expect("parse"),
        no_env,
    )
    .expect("resolve");
    let err = resolved
        .target(&ProductName::from("webapp"), &DeploymentName::from("qa"))
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownDeployment { .. }));
    assert!(err.to_string().contains("staging, production"));
}

#[test]
fn missing_credentials_without_env_is_missing_section() {
    let without_creds = VALID
        .split("aws-credentials:")
        .next()
        .expect("prefix")
        .to_string();
    let err = DeployConfig::resolve(
        config::ConfigFile::parse(&without_creds).expect("parse"),
        no_env,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "missing configuration section: aws-credentials");
}

#[test]
fn env_credentials_make_section_optional() {
    let without_creds = VALID
        .split("aws-credentials:")
        .next()
        .expect("prefix")
        .to_string();
    let env = |var: &str| Some(format!("from-{var}"));
    let resolved = DeployConfig::resolve(
        config::ConfigFile::parse(&without_creds).expect("parse"),
        env,
    )
    .expect("resolve");
    assert_eq!(
        resolved.credentials.access_id,
        format!("from-{}", config::ACCESS_ID_ENV)
    );
}
