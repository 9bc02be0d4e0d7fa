//! Common test utilities and fixtures
//!
//! Shared helpers for the binary-level tests

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path (mock provider, cache disabled)
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// A matcher command with a clean `TEAMSKILLS_*` environment
pub fn matcher_cmd() -> Command {
    let mut cmd = Command::cargo_bin("teamskills-matcher").unwrap();
    for (key, _) in std::env::vars() {
        if key.starts_with("TEAMSKILLS_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// `match` against a fixture request using the offline config
pub fn match_fixture(request: &str) -> Command {
    let mut cmd = matcher_cmd();
    cmd.arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .arg("--input")
        .arg(fixture_path(request));
    cmd
}

/// Parse a successful command's stdout as JSON
pub fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
    }

    #[test]
    fn test_valid_config_exists() {
        assert!(
            valid_config_fixture().exists(),
            "Valid config fixture should exist"
        );
    }

    #[test]
    fn test_invalid_config_exists() {
        assert!(
            invalid_config_fixture().exists(),
            "Invalid config fixture should exist"
        );
    }
}
