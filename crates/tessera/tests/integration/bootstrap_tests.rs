//! Bootstrap Tests

use std::fs;

use tempfile::TempDir;
use tessera::bootstrap::build_catalog;
use tessera::infrastructure::config::{CatalogConfig, ConfigLoader};
use tessera::providers::{FactoryProvider, InterfaceProvider, ValueProvider};
use tessera::{Error, Factory, FactoryCatalogExt, ValueCatalogExt, instance};

#[test]
fn test_default_configuration_includes_reference_providers() {
    let catalog = build_catalog(&CatalogConfig::default()).unwrap();

    assert_eq!(catalog.name(), "world");
    assert!(catalog.provider::<ValueProvider>().is_ok());
    assert!(catalog.provider::<FactoryProvider>().is_ok());
    assert!(catalog.provider::<InterfaceProvider>().is_ok());
    assert!(!catalog.is_frozen());
}

#[test]
fn test_bootstrap_from_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");
    fs::write(
        &config_path,
        r#"
[catalog]
name = "orders"
providers = ["values", "factories"]
"#,
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap();
    let catalog = build_catalog(&config.catalog).unwrap();

    assert_eq!(catalog.name(), "orders");
    assert!(catalog.provider::<ValueProvider>().is_ok());
    assert!(catalog.provider::<FactoryProvider>().is_ok());
    assert!(matches!(
        catalog.provider::<InterfaceProvider>().unwrap_err(),
        Error::MissingProvider { .. }
    ));

    catalog.provide_value("region", instance("eu-west-1")).unwrap();
    catalog
        .provide_factory(
            "bucket",
            Factory::singleton(|resolver| {
                let region = resolver.get_as::<&str>("region")?;
                Ok(instance(format!("orders-{region}")))
            }),
        )
        .unwrap();
    assert_eq!(
        catalog.get_as::<String>("bucket").unwrap().as_str(),
        "orders-eu-west-1"
    );
}

#[test]
fn test_frozen_configuration_rejects_registration() {
    let config = CatalogConfig {
        freeze: true,
        ..CatalogConfig::default()
    };
    let catalog = build_catalog(&config).unwrap();

    assert!(catalog.is_frozen());
    let err = catalog.provide_value("late", instance(1_u8)).unwrap_err();
    assert!(matches!(err, Error::FrozenCatalog { .. }));
}

#[test]
fn test_unknown_provider_type_fails() {
    let config = CatalogConfig {
        providers: vec!["values".to_string(), "quantum".to_string()],
        ..CatalogConfig::default()
    };

    let err = build_catalog(&config).unwrap_err();
    assert!(matches!(err, Error::UnknownProviderType { .. }));
}
