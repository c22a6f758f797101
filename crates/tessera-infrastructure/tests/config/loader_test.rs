//! Configuration Loader Tests

use tessera_domain::error::Error;
use tessera_infrastructure::config::{ConfigBuilder, ConfigLoader, LoggingConfig};
use tessera_infrastructure::constants::DEFAULT_LOG_LEVEL;
use tempfile::TempDir;

#[test]
fn test_config_loader_default() {
    let config = ConfigLoader::new().load().unwrap();

    assert_eq!(config.catalog.name, "world");
    assert_eq!(
        config.catalog.providers,
        vec!["values", "factories", "interfaces"]
    );
    assert!(!config.catalog.freeze);
    assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .with_catalog_name("billing")
        .with_providers(["values"])
        .with_freeze(true)
        .build();

    assert_eq!(config.catalog.name, "billing");
    assert_eq!(config.catalog.providers, vec!["values"]);
    assert!(config.catalog.freeze);
}

#[test]
fn test_config_save_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");
    let original = ConfigBuilder::new()
        .with_catalog_name("orders")
        .with_logging(LoggingConfig {
            level: "debug".to_string(),
            json_format: true,
            file_output: None,
        })
        .build();

    ConfigLoader::new().save_to_file(&original, &config_path).unwrap();
    let loaded = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");
    std::fs::write(&config_path, "[catalog]\nname = \"inventory\"\n").unwrap();

    let config = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap();

    assert_eq!(config.catalog.name, "inventory");
    assert_eq!(config.catalog.providers.len(), 3);
    assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new().with_config_path(temp_dir.path().join("absent.toml"));

    let config = loader.load().unwrap();

    assert_eq!(config.catalog.name, "world");
    assert!(loader.config_path().is_some());
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let cases = [
        ("empty_name.toml", "[catalog]\nname = \"  \"\n"),
        (
            "duplicate.toml",
            "[catalog]\nproviders = [\"values\", \"values\"]\n",
        ),
        ("level.toml", "[logging]\nlevel = \"loud\"\n"),
    ];

    for (file, contents) in cases {
        let path = temp_dir.path().join(file);
        std::fs::write(&path, contents).unwrap();

        let result = ConfigLoader::new().with_config_path(&path).load();

        assert!(
            matches!(result, Err(Error::Configuration { .. })),
            "{file} should be rejected"
        );
    }
}
