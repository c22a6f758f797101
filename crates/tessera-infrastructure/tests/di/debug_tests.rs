//! Dependency Tree Rendering Tests

use tessera_domain::error::Error;
use tessera_domain::{Key, Lifetime, instance};
use tessera_infrastructure::ports::recipe;

use crate::test_utils::{catalog_with_recipes, define_with};

#[test]
fn test_debug_renders_dependencies() {
    let catalog = catalog_with_recipes("app");
    catalog.register_scope_var("tenant", Some(instance(1_u8))).unwrap();
    define_with(
        &catalog,
        Key::from("db"),
        Lifetime::Singleton,
        recipe(|_| Ok(instance(1_u8))),
        true,
        Vec::new(),
    )
    .unwrap();
    define_with(
        &catalog,
        Key::from("service"),
        Lifetime::Transient,
        recipe(|_| Ok(instance(2_u8))),
        true,
        vec![Key::from("db"), Key::from("tenant"), Key::from("ghost")],
    )
    .unwrap();

    let tree = catalog.debug("service").unwrap();
    let lines: Vec<&str> = tree.lines().collect();

    assert_eq!(lines.len(), 4, "tree was:\n{tree}");
    assert_eq!(lines[0], "service [transient] recipe (app)");
    assert_eq!(lines[1], "  db [singleton] recipe (app)");
    assert_eq!(lines[2], "  tenant scope variable (version 0) (app)");
    assert_eq!(lines[3], "  ghost <missing>");
}

#[test]
fn test_debug_marks_cycles() {
    let catalog = catalog_with_recipes("app");
    for (key, dependency) in [("a", "b"), ("b", "a")] {
        define_with(
            &catalog,
            Key::from(key),
            Lifetime::Singleton,
            recipe(|_| Ok(instance(0_u8))),
            true,
            vec![Key::from(dependency)],
        )
        .unwrap();
    }

    let tree = catalog.debug("a").unwrap();

    assert!(tree.lines().last().is_some_and(|line| line.ends_with("<cycle>")), "tree was:\n{tree}");
}

#[test]
fn test_debug_of_missing_key_fails() {
    let catalog = catalog_with_recipes("app");

    assert!(matches!(
        catalog.debug("missing"),
        Err(Error::DependencyNotFound { .. })
    ));
}
