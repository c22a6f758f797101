//! Cycle Detection Tests

use tessera_domain::error::Error;
use tessera_domain::{Key, Lifetime, instance};

use crate::test_utils::{catalog_with_recipes, define};

#[test]
fn test_mutual_dependency_is_reported_with_chain() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "a", Lifetime::Singleton, |resolver| resolver.get("b")).unwrap();
    define(&catalog, "b", Lifetime::Singleton, |resolver| resolver.get("a")).unwrap();
    define(&catalog, "c", Lifetime::Singleton, |_| Ok(instance(3_u8))).unwrap();

    let error = catalog.get("a").unwrap_err();

    match &error {
        Error::DependencyCycle { chain } => {
            assert_eq!(chain, &vec![Key::from("a"), Key::from("b"), Key::from("a")]);
        }
        other => panic!("expected cycle, got {other}"),
    }
    assert_eq!(error.to_string(), "Dependency cycle: a -> b -> a");
    assert!(catalog.get("c").is_ok(), "unrelated keys resolve after a cycle");
    assert!(
        matches!(catalog.get("b"), Err(Error::DependencyCycle { .. })),
        "nothing is cached by a failed resolution"
    );
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "loop", Lifetime::Transient, |resolver| resolver.get("loop")).unwrap();

    assert!(matches!(
        catalog.get("loop"),
        Err(Error::DependencyCycle { .. })
    ));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "config", Lifetime::Singleton, |_| Ok(instance(1_u8))).unwrap();
    define(&catalog, "left", Lifetime::Transient, |resolver| resolver.get("config")).unwrap();
    define(&catalog, "right", Lifetime::Transient, |resolver| resolver.get("config")).unwrap();
    define(&catalog, "top", Lifetime::Transient, |resolver| {
        resolver.get("left")?;
        resolver.get("right")
    })
    .unwrap();

    assert!(catalog.get("top").is_ok());
}

#[test]
fn test_catalog_usable_after_cycle_in_other_thread() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "a", Lifetime::Singleton, |resolver| resolver.get("a")).unwrap();
    define(&catalog, "b", Lifetime::Singleton, |_| Ok(instance(2_u8))).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| assert!(catalog.get("a").is_err()));
    });

    // The failed call released the layer lock on its way out
    assert!(catalog.get("b").is_ok());
}
