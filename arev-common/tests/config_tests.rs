//! Tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Priority order for root folder resolution (CLI > env > TOML > default)
//! - Missing TOML files never cause an error
//! - Root folder creation and database path layout
//!
//! Tests that manipulate AREV_ROOT_FOLDER or AREV_ROOT are marked #[serial]
//! so they never race each other.

use arev_common::config::{
    CliOverrides, CompiledDefaults, LoggingConfig, RootFolderInitializer, RootFolderResolver,
    ServiceSettings, TomlConfig, DATABASE_FILE_NAME, DEFAULT_PORT, ENV_ROOT, ENV_ROOT_FOLDER,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn clear_root_env() {
    env::remove_var(ENV_ROOT_FOLDER);
    env::remove_var(ENV_ROOT);
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("arev") || defaults.root_folder.ends_with("arev_data"));
    assert_eq!(defaults.port, DEFAULT_PORT);
    assert_eq!(defaults.bind_address, "127.0.0.1");
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());
}

#[test]
#[serial]
fn test_resolver_with_empty_toml_uses_default() {
    clear_root_env();

    let resolver = RootFolderResolver::new("test-module").with_toml(Some(TomlConfig::default()));
    let root_folder = resolver.resolve();

    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    clear_root_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/arev-test-env-folder");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arev-test-env-folder"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_env_var_root() {
    clear_root_env();
    env::set_var(ENV_ROOT, "/tmp/arev-test-env-root");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arev-test-env-root"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_root_folder_var_takes_precedence() {
    clear_root_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/arev-priority-1");
    env::set_var(ENV_ROOT, "/tmp/arev-priority-2");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arev-priority-1"));

    clear_root_env();
}

#[test]
#[serial]
fn test_cli_override_beats_environment() {
    clear_root_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/arev-from-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_cli_override(Some(PathBuf::from("/tmp/arev-from-cli")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arev-from-cli"));

    clear_root_env();
}

#[test]
#[serial]
fn test_toml_root_folder_used_without_env() {
    clear_root_env();

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/arev")),
        ..TomlConfig::default()
    };
    let root_folder = RootFolderResolver::new("test-module")
        .with_toml(Some(toml))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/srv/arev"));
}

#[test]
#[serial]
fn test_resolver_missing_config_file_does_not_error() {
    clear_root_env();

    // Module name that will not have a config file
    let resolver = RootFolderResolver::new("nonexistent-test-module-12345");
    let root_folder = resolver.resolve();

    assert!(!root_folder.as_os_str().is_empty());
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/arev-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));
    assert_eq!(initializer.root_folder(), root.as_path());
}

#[test]
fn test_initializer_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());
    let result = initializer.ensure_directory_exists();

    assert!(result.is_ok(), "Failed to create directory: {:?}", result.err());
    assert!(root.is_dir(), "Nested directory was not created");

    // Second call is a no-op
    assert!(initializer.ensure_directory_exists().is_ok());
}

#[test]
fn test_toml_roundtrip() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/data/review")),
        port: Some(6000),
        bind_address: Some("0.0.0.0".to_string()),
        max_upload_bytes: Some(1024),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
    };

    let toml_str = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed.root_folder, Some(PathBuf::from("/data/review")));
    assert_eq!(parsed.port, Some(6000));
    assert_eq!(parsed.bind_address.as_deref(), Some("0.0.0.0"));
    assert_eq!(parsed.max_upload_bytes, Some(1024));
    assert_eq!(parsed.logging.level, "debug");
}

#[test]
fn test_partial_toml_fills_defaults() {
    let toml_str = r#"
        port = 7001
        [logging]
    "#;

    let config: TomlConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.port, Some(7001));
    assert_eq!(config.root_folder, None);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
#[serial]
fn test_service_settings_priority() {
    clear_root_env();

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        port: Some(6100),
        bind_address: Some("10.0.0.1".to_string()),
        max_upload_bytes: Some(4096),
        logging: LoggingConfig::default(),
    };
    let cli = CliOverrides {
        root_folder: None,
        port: Some(6200),
        bind_address: None,
    };

    let settings = ServiceSettings::resolve_with("test-module", cli, Some(toml));

    assert_eq!(settings.root_folder, PathBuf::from("/from/toml"));
    assert_eq!(settings.port, 6200);
    assert_eq!(settings.bind_address, "10.0.0.1");
    assert_eq!(settings.max_upload_bytes, 4096);
}

#[test]
#[serial]
fn test_service_settings_defaults_without_toml() {
    clear_root_env();

    let settings =
        ServiceSettings::resolve_with("test-module", CliOverrides::default(), None);
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(settings.root_folder, defaults.root_folder);
    assert_eq!(settings.port, defaults.port);
    assert_eq!(settings.max_upload_bytes, defaults.max_upload_bytes);
    assert_eq!(settings.logging, LoggingConfig::default());
}
