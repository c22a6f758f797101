//! Provider Type Registry Tests

use tessera_domain::constants::{FACTORIES_PROVIDER, INTERFACES_PROVIDER, VALUES_PROVIDER};
use tessera_infrastructure::ports::{list_provider_types, resolve_provider_type};
use tessera_providers::{FACTORIES, FactoryProvider, INTERFACES, VALUES, ValueProvider};

#[test]
fn test_reference_providers_are_registered() {
    let names: Vec<&str> = list_provider_types()
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    for expected in [VALUES_PROVIDER, FACTORIES_PROVIDER, INTERFACES_PROVIDER] {
        assert!(names.contains(&expected), "missing provider type {expected}");
    }
}

#[test]
fn test_resolved_types_match_constants() {
    assert_eq!(
        resolve_provider_type(VALUES_PROVIDER).unwrap().type_id(),
        VALUES.type_id()
    );
    assert_eq!(
        resolve_provider_type(FACTORIES_PROVIDER).unwrap().type_id(),
        FACTORIES.type_id()
    );
    assert_eq!(
        resolve_provider_type(INTERFACES_PROVIDER).unwrap().name(),
        INTERFACES.name()
    );
}

#[test]
fn test_included_provider_is_an_instance_of_its_type() {
    let catalog = tessera_infrastructure::Catalog::new("app");
    catalog.include(resolve_provider_type(VALUES_PROVIDER).unwrap()).unwrap();
    catalog.include(FACTORIES).unwrap();

    let values = catalog.provider::<ValueProvider>().unwrap();
    assert!(VALUES.is_instance(&*values));
    assert!(!FACTORIES.is_instance(&*values));
    assert!(catalog.provider::<FactoryProvider>().is_ok());
}
