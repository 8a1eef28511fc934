//! Registry classification and config-loading integration tests.

use assert_fs::prelude::*;
use fanout_core::{
    config::CONFIG_FILE_NAME, Category, ConfigError, FleetConfig, Registry,
};
use predicates::prelude::predicate;
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Classification
// ---------------------------------------------------------------------------

#[rstest]
#[case("origin", Category::Primary)]
#[case("canonical", Category::Canonical)]
#[case("legacy", Category::Excluded)]
#[case("vendor-docs", Category::External)]
#[case("flavor-debian", Category::Flavor)]
#[case("Origin", Category::Flavor)]
fn classify_from_loaded_config(#[case] name: &str, #[case] expected: Category) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child(CONFIG_FILE_NAME)
        .write_str(
            "excluded: [legacy]\n\
             external:\n  - name: vendor-docs\n    url: https://example.com/docs.git\n",
        )
        .expect("write config");

    let config = FleetConfig::load(&FleetConfig::path_in(dir.path())).expect("load");
    let registry = Registry::from_config(&config);
    assert_eq!(registry.classify(name), expected);
}

#[test]
fn classification_is_stable_across_calls() {
    let registry = Registry::default();
    for _ in 0..3 {
        assert_eq!(registry.classify("origin"), Category::Primary);
        assert_eq!(registry.classify("fork"), Category::Flavor);
    }
}

#[test]
fn custom_primary_and_canonical_names() {
    let config = FleetConfig {
        primary: "upstream".to_string(),
        canonical: "mirror".to_string(),
        ..FleetConfig::default()
    };
    let registry = Registry::from_config(&config);
    assert_eq!(registry.classify("upstream"), Category::Primary);
    assert_eq!(registry.classify("mirror"), Category::Canonical);
    assert_eq!(registry.classify("origin"), Category::Flavor);
}

#[test]
fn every_remote_gets_exactly_one_entry() {
    let registry = Registry::default();
    let names = ["origin", "canonical", "a", "b", "c"];
    let remotes = registry.remotes(names);
    assert_eq!(remotes.len(), names.len());
}

// ---------------------------------------------------------------------------
// 2. Config load errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(CONFIG_FILE_NAME);
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = FleetConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}

#[test]
fn zero_concurrency_is_invalid() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(CONFIG_FILE_NAME);
    file.write_str("concurrency: 0\n").expect("write");

    let err = FleetConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

#[test]
fn loading_never_writes_the_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    FleetConfig::load(&FleetConfig::path_in(dir.path())).expect("load defaults");
    dir.child(CONFIG_FILE_NAME).assert(predicate::path::missing());
}
