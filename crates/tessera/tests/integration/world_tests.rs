//! Default Catalog Tests
//!
//! The default catalog is process-wide, so every assertion lives in one test.

use tessera::{Catalog, ValueCatalogExt, VALUES, install_world, instance, reset_world, world};

#[test]
fn test_world_lifecycle() {
    reset_world();

    let first = world().unwrap();
    assert_eq!(first.name(), "world");
    assert!(first.same_catalog(&world().unwrap()));

    first.provide_value("greeting", instance("hello")).unwrap();
    assert_eq!(*world().unwrap().get_as::<&str>("greeting").unwrap(), "hello");

    let custom = Catalog::new("custom");
    custom.include(VALUES).unwrap();
    let previous = install_world(custom.clone()).unwrap();
    assert!(previous.same_catalog(&first));
    assert!(world().unwrap().same_catalog(&custom));

    let removed = reset_world().unwrap();
    assert!(removed.same_catalog(&custom));

    let fresh = world().unwrap();
    assert!(!fresh.same_catalog(&first));
    assert!(fresh.get_opt("greeting").unwrap().is_none());
    reset_world();
}
