//! Catalog Tests
//!
//! Registration, visibility between twins and child catalogs.

use tessera_domain::error::Error;
use tessera_domain::{Key, Lifetime, instance, same_instance};
use tessera_infrastructure::di::{Catalog, Include};

use crate::test_utils::{RECIPES, RecipeProvider, catalog_with_recipes, define};

#[test]
fn test_get_missing_key_is_not_found() {
    let catalog = catalog_with_recipes("app");

    let error = catalog.get("missing").unwrap_err();

    assert!(error.is_not_found_for(&Key::from("missing")), "got {error}");
    assert_eq!(error.to_string(), "Dependency not found: missing");
}

#[test]
fn test_get_or_and_get_opt_fall_back() {
    let catalog = catalog_with_recipes("app");
    let fallback = instance(7_u32);

    let value = catalog.get_or("missing", fallback.clone()).unwrap();

    assert!(same_instance(&value, &fallback));
    assert!(catalog.get_opt("missing").unwrap().is_none());
}

#[test]
fn test_get_as_with_wrong_type_fails() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "port", Lifetime::Singleton, |_| Ok(instance(8080_u16))).unwrap();

    assert_eq!(*catalog.get_as::<u16>("port").unwrap(), 8080);
    assert!(matches!(
        catalog.get_as::<String>("port"),
        Err(Error::UnexpectedType { .. })
    ));
}

#[test]
fn test_including_provider_type_twice_fails() {
    let catalog = catalog_with_recipes("app");

    let result = catalog.include(RECIPES);

    assert!(matches!(result, Err(Error::DuplicateProvider { .. })));
}

#[test]
fn test_defining_key_twice_fails() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "db", Lifetime::Singleton, |_| Ok(instance(1_u8))).unwrap();

    let result = define(&catalog, "db", Lifetime::Singleton, |_| Ok(instance(2_u8)));

    assert!(matches!(result, Err(Error::DuplicateDependency { .. })));
}

#[test]
fn test_typed_provider_lookup() {
    let catalog = Catalog::new("app");
    assert!(matches!(
        catalog.provider::<RecipeProvider>(),
        Err(Error::MissingProvider { .. })
    ));

    catalog.include(RECIPES).unwrap();

    assert!(catalog.provider::<RecipeProvider>().is_ok());
    assert!(catalog.private().provider::<RecipeProvider>().is_err());
}

#[test]
fn test_freeze_blocks_registration_but_not_resolution() {
    let catalog = catalog_with_recipes("app");
    let child = Catalog::new("child");
    catalog.add_child(&child).unwrap();
    define(&catalog, "db", Lifetime::Singleton, |_| Ok(instance(1_u8))).unwrap();

    catalog.freeze();

    assert!(catalog.is_frozen());
    assert!(catalog.private().is_frozen());
    assert!(child.is_frozen(), "freeze must reach children");
    assert!(matches!(
        define(&catalog, "cache", Lifetime::Singleton, |_| Ok(instance(2_u8))),
        Err(Error::FrozenCatalog { .. })
    ));
    assert!(matches!(
        catalog.private().include(RECIPES),
        Err(Error::FrozenCatalog { .. })
    ));
    assert!(matches!(
        catalog.add_child(&Catalog::new("late")),
        Err(Error::FrozenCatalog { .. })
    ));
    assert!(catalog.get("db").is_ok());
}

#[test]
fn test_private_twin_is_hidden_from_public_handle() {
    let catalog = catalog_with_recipes("app");
    let private = catalog.private();
    private.include(RECIPES).unwrap();
    define(&private, "secret", Lifetime::Singleton, |_| Ok(instance("s3cr3t"))).unwrap();
    define(&catalog, "greeting", Lifetime::Singleton, |resolver| {
        let secret = resolver.get_as::<&str>("secret")?;
        Ok(instance(format!("hello {secret}")))
    })
    .unwrap();

    assert!(catalog.get("secret").unwrap_err().is_not_found_for(&Key::from("secret")));
    assert!(!catalog.can_provide("secret"));
    assert!(private.can_provide("secret"));
    assert_eq!(*private.get_as::<&str>("secret").unwrap(), "s3cr3t");
    assert_eq!(
        catalog.get_as::<String>("greeting").unwrap().as_str(),
        "hello s3cr3t",
        "public providers resolve private dependencies"
    );
}

#[test]
fn test_children_expose_public_twin_only() {
    let parent = catalog_with_recipes("parent");
    let child = catalog_with_recipes("child");
    child.private().include(RECIPES).unwrap();
    define(&child, "db", Lifetime::Singleton, |_| Ok(instance("child-db"))).unwrap();
    define(&child.private(), "pool", Lifetime::Singleton, |_| Ok(instance(4_u8))).unwrap();
    define(&parent, "config", Lifetime::Singleton, |_| Ok(instance("parent-config"))).unwrap();

    parent.include(&child).unwrap();

    assert_eq!(*parent.get_as::<&str>("db").unwrap(), "child-db");
    assert!(parent.get_opt("pool").unwrap().is_none());
    assert!(child.get_opt("config").unwrap().is_none(), "parents are invisible to children");
    assert!(same_instance(&parent.get("db").unwrap(), &child.get("db").unwrap()));
}

#[test]
fn test_own_providers_win_over_children() {
    let parent = catalog_with_recipes("parent");
    let child = catalog_with_recipes("child");
    define(&child, "name", Lifetime::Singleton, |_| Ok(instance("child"))).unwrap();
    define(&parent, "name", Lifetime::Singleton, |_| Ok(instance("parent"))).unwrap();
    parent.add_child(&child).unwrap();

    assert_eq!(*parent.get_as::<&str>("name").unwrap(), "parent");
}

#[test]
fn test_child_attachment_rules() {
    let root = Catalog::new("root");
    let middle = Catalog::new("middle");
    let leaf = Catalog::new("leaf");
    root.add_child(&middle).unwrap();
    middle.add_child(&leaf).unwrap();

    let second_parent = root.add_child(&leaf);
    let cycle = leaf.add_child(&root);
    let itself = root.add_child(&root);
    let private = root.add_child(&Catalog::new("hidden").private());
    let twice = root.add_child(&middle);

    for result in [second_parent, cycle, itself, private, twice] {
        assert!(
            matches!(result, Err(Error::CatalogAttachment { .. })),
            "expected attachment error, got {result:?}"
        );
    }
}

#[test]
fn test_setup_include_runs_against_handle() {
    let catalog = Catalog::new("app");

    catalog
        .include_all([
            Include::from(RECIPES),
            Include::setup(|catalog| {
                define(catalog, "answer", Lifetime::Singleton, |_| Ok(instance(42_u32)))
            }),
        ])
        .unwrap();

    assert_eq!(*catalog.get_as::<u32>("answer").unwrap(), 42);
}

#[test]
fn test_type_keys_and_named_keys_do_not_collide() {
    struct Database;
    let catalog = catalog_with_recipes("app");
    define(&catalog, Key::of::<Database>(), Lifetime::Singleton, |_| Ok(instance("typed"))).unwrap();
    define(&catalog, "Database", Lifetime::Singleton, |_| Ok(instance("named"))).unwrap();

    assert_eq!(*catalog.get_as::<&str>(Key::of::<Database>()).unwrap(), "typed");
    assert_eq!(*catalog.get_as::<&str>("Database").unwrap(), "named");
}

#[test]
fn test_display_marks_private_handle() {
    let catalog = Catalog::new("app");
    assert_eq!(catalog.to_string(), "app");
    assert_eq!(catalog.private().to_string(), "app#private");
    assert_eq!(catalog.private().public().to_string(), "app");
}
