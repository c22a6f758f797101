//! Interface Provider Tests

use std::sync::Arc;

use tessera_domain::error::Error;
use tessera_domain::{Instance, Key, instance, same_instance};
use tessera_infrastructure::di::Catalog;
use tessera_providers::{
    AllImplementations, INTERFACES, InterfaceCatalogExt, InterfaceProvider, VALUES,
    ValueCatalogExt,
};

fn storage_catalog() -> Catalog {
    let catalog = Catalog::new("app");
    catalog.include_all([VALUES, INTERFACES]).unwrap();
    catalog.provide_value("local", instance("local")).unwrap();
    catalog.provide_value("s3", instance("s3")).unwrap();
    catalog.provide_value("gcs", instance("gcs")).unwrap();
    catalog
}

fn names(values: &Arc<Vec<Instance>>) -> Vec<&'static str> {
    values
        .iter()
        .map(|value| *value.downcast_ref::<&'static str>().unwrap())
        .collect()
}

#[test]
fn test_interface_resolves_highest_weight() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "local", 0).unwrap();
    catalog.bind_interface("storage", "s3", 10).unwrap();

    assert!(same_instance(
        &catalog.get("storage").unwrap(),
        &catalog.get("s3").unwrap()
    ));
}

#[test]
fn test_equal_weights_keep_registration_order() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "gcs", 5).unwrap();
    catalog.bind_interface("storage", "s3", 5).unwrap();

    assert_eq!(*catalog.get_as::<&str>("storage").unwrap(), "gcs");
}

#[test]
fn test_all_implementations_in_weight_order() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "local", 0).unwrap();
    catalog.bind_interface("storage", "s3", 10).unwrap();
    catalog.bind_interface("storage", "gcs", 5).unwrap();

    let all = catalog
        .get_as::<Vec<Instance>>(AllImplementations::key("storage"))
        .unwrap();
    assert_eq!(names(&all), vec!["s3", "gcs", "local"]);
}

#[test]
fn test_rebinding_updates_weight() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "local", 0).unwrap();
    catalog.bind_interface("storage", "s3", 10).unwrap();
    catalog.bind_interface("storage", "local", 20).unwrap();

    let interfaces = catalog.provider::<InterfaceProvider>().unwrap();
    assert_eq!(
        interfaces.implementations(&"storage".into()),
        vec![Key::from("local"), Key::from("s3")]
    );
    assert_eq!(*catalog.get_as::<&str>("storage").unwrap(), "local");
}

#[test]
fn test_interface_key_taken_by_value_is_rejected() {
    let catalog = storage_catalog();

    let err = catalog.bind_interface("local", "s3", 0).unwrap_err();
    assert!(matches!(err, Error::DuplicateDependency { .. }));
    assert_eq!(*catalog.get_as::<&str>("local").unwrap(), "local");
}

#[test]
fn test_value_key_taken_by_interface_is_rejected() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "local", 0).unwrap();

    let err = catalog.provide_value("storage", instance("raw")).unwrap_err();
    assert!(matches!(err, Error::DuplicateDependency { .. }));
}

#[test]
fn test_unbound_interface_is_not_found() {
    let catalog = storage_catalog();

    assert!(!catalog.can_provide("storage"));
    assert!(!catalog.can_provide(AllImplementations::key("storage")));
    let err = catalog.get("storage").unwrap_err();
    assert!(err.is_not_found_for(&"storage".into()));
}

#[test]
fn test_missing_implementation_propagates_not_found() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "azure", 100).unwrap();

    let err = catalog.get("storage").unwrap_err();
    assert!(matches!(err, Error::DependencyNotFound { .. }));
}

#[test]
fn test_interface_follows_overridden_implementation() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "s3", 10).unwrap();

    {
        let env = catalog.test().clone(Default::default()).unwrap();
        env.overrides().set("s3", instance("fake-s3")).unwrap();
        assert_eq!(*catalog.get_as::<&str>("storage").unwrap(), "fake-s3");
    }

    assert_eq!(*catalog.get_as::<&str>("storage").unwrap(), "s3");
}

#[test]
fn test_interface_debug_lists_implementations() {
    let catalog = storage_catalog();
    catalog.bind_interface("storage", "s3", 10).unwrap();
    catalog.bind_interface("storage", "local", 0).unwrap();

    let tree = catalog.debug(AllImplementations::key("storage")).unwrap();
    let lines: Vec<&str> = tree.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("[transient] all implementations"));
    assert!(lines[1].starts_with("  s3 [singleton] value"));
    assert!(lines[2].starts_with("  local [singleton] value"));
}
