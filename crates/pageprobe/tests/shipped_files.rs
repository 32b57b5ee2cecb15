//! The configuration and fixtures checked into the repository stay loadable.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pageprobe::{SuiteConfig, TestData, DEFAULT_BASE_URL};
use std::path::PathBuf;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn test_sample_config_is_valid() {
    let config = SuiteConfig::load(&repo_root().join("pageprobe.yaml")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert!(config.browser.headless);
    assert_eq!(config.fixtures, Some(PathBuf::from("fixtures/users.json")));
}

#[test]
fn test_users_fixture_matches_defaults() {
    let data = TestData::load(&repo_root().join("fixtures/users.json")).unwrap();
    assert_eq!(data, TestData::default());
}
