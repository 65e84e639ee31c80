//! Tests for root folder resolution and TOML config loading
//!
//! Uses serial_test to prevent ENV variable races: tests that touch
//! MATHGEN_* variables are marked #[serial].

use mathgen_common::config::{
    load_toml_config, CompiledDefaults, RemoteConfig, RootFolderInitializer, RootFolderResolver, TomlConfig,
    DATABASE_FILE_NAME, ENV_BASE_URL, ENV_MAX_FETCH_ATTEMPTS, ENV_ROOT_FOLDER,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_ROOT_FOLDER);
    env::remove_var(ENV_BASE_URL);
    env::remove_var(ENV_MAX_FETCH_ATTEMPTS);
}

#[test]
#[serial]
fn test_resolver_with_missing_config_file_uses_default() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let resolver = RootFolderResolver::new("test-module")
        .with_config_file(Some(temp_dir.path().join("missing.toml")));

    assert_eq!(
        resolver.resolve(),
        CompiledDefaults::for_current_platform().root_folder
    );
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    env::set_var(ENV_ROOT_FOLDER, "/tmp/mathgen-from-env");

    let resolver = RootFolderResolver::new("test-module")
        .with_cli_override(Some(PathBuf::from("/tmp/mathgen-from-cli")));

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mathgen-from-cli"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sync.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/mathgen-from-toml\"\n").unwrap();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/mathgen-from-env");

    let resolver = RootFolderResolver::new("sync").with_config_file(Some(config_path));

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mathgen-from-env"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_reads_toml_root_folder() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sync.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/mathgen-from-toml\"\n").unwrap();

    let resolver = RootFolderResolver::new("sync").with_config_file(Some(config_path));

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mathgen-from-toml"));
}

#[test]
#[serial]
fn test_resolve_with_preloaded_config() {
    clear_env();
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/mathgen-preloaded")),
        ..TomlConfig::default()
    };

    let resolver = RootFolderResolver::new("sync");
    assert_eq!(
        resolver.resolve_with_config(&config),
        PathBuf::from("/tmp/mathgen-preloaded")
    );

    let resolver = resolver.with_cli_override(Some(PathBuf::from("/tmp/mathgen-from-cli")));
    assert_eq!(
        resolver.resolve_with_config(&config),
        PathBuf::from("/tmp/mathgen-from-cli")
    );
}

#[test]
#[serial]
fn test_malformed_toml_falls_back_to_defaults() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sync.toml");
    std::fs::write(&config_path, "root_folder = [not valid").unwrap();

    assert!(load_toml_config(&config_path).is_err());

    let resolver = RootFolderResolver::new("sync").with_config_file(Some(config_path));
    assert!(resolver.try_load_config().is_err());
    let config = resolver.load_config();
    assert_eq!(config.remote, RemoteConfig::default());
}

#[test]
fn test_try_load_config_reads_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sync.toml");
    std::fs::write(&config_path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let resolver = RootFolderResolver::new("sync").with_config_file(Some(config_path));
    let config = resolver.try_load_config().unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.remote, RemoteConfig::default());
}

#[test]
fn test_toml_remote_section() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sync.toml");
    std::fs::write(
        &config_path,
        r#"
[remote]
base_url = "http://localhost:8080"
max_fetch_attempts = 2
initial_backoff_ms = 1
"#,
    )
    .unwrap();

    let config = load_toml_config(&config_path).unwrap();
    assert_eq!(config.remote.base_url, "http://localhost:8080");
    assert_eq!(config.remote.max_fetch_attempts, 2);
    assert_eq!(config.remote.initial_backoff_ms, 1);
    assert_eq!(config.remote.timeout_secs, RemoteConfig::default().timeout_secs);
}

#[test]
#[serial]
fn test_remote_env_overrides() {
    env::set_var(ENV_BASE_URL, "http://mirror.example.org/");
    env::set_var(ENV_MAX_FETCH_ATTEMPTS, "3");

    let config = RemoteConfig::default().with_env_overrides().unwrap();
    assert_eq!(config.base_url, "http://mirror.example.org");
    assert_eq!(config.max_fetch_attempts, 3);

    clear_env();
}

#[test]
#[serial]
fn test_remote_env_override_rejects_garbage() {
    env::set_var(ENV_MAX_FETCH_ATTEMPTS, "lots");

    assert!(RemoteConfig::default().with_env_overrides().is_err());

    clear_env();
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/mathgen-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));
}

#[test]
fn test_initializer_idempotent_directory_creation() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    assert!(!initializer.database_exists());

    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
}
