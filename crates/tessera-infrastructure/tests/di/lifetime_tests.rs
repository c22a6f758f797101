//! Lifetime Tests
//!
//! Singleton, transient and scoped caching, and the lifetime contract
//! checked after each provider call.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tessera_domain::error::Error;
use tessera_domain::{Key, Lifetime, instance, same_instance};
use tessera_infrastructure::ports::recipe;

use crate::test_utils::{catalog_with_recipes, counting, define, define_with, get_usize};

#[test]
fn test_singleton_is_computed_once() {
    let catalog = catalog_with_recipes("app");
    let calls = Arc::new(AtomicUsize::new(0));
    define(&catalog, "db", Lifetime::Singleton, counting(&calls)).unwrap();

    let first = catalog.get("db").unwrap();
    let second = catalog.get("db").unwrap();

    assert!(same_instance(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_runs_recipe_every_time() {
    let catalog = catalog_with_recipes("app");
    let calls = Arc::new(AtomicUsize::new(0));
    define(&catalog, "request_id", Lifetime::Transient, counting(&calls)).unwrap();

    let values: Vec<usize> = (0..3).map(|_| get_usize(&catalog, "request_id")).collect();

    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn test_uncached_transient_asks_provider_every_time() {
    let catalog = catalog_with_recipes("app");
    let calls = Arc::new(AtomicUsize::new(0));
    define_with(
        &catalog,
        Key::from("nonce"),
        Lifetime::Transient,
        recipe(counting(&calls)),
        false,
        Vec::new(),
    )
    .unwrap();

    assert_eq!(get_usize(&catalog, "nonce"), 1);
    assert_eq!(get_usize(&catalog, "nonce"), 2);
}

#[test]
fn test_scoped_value_is_reused_until_scope_var_changes() {
    let catalog = catalog_with_recipes("app");
    catalog.register_scope_var("tenant", Some(instance("acme"))).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    define(&catalog, "connection", Lifetime::Scoped, move |resolver| {
        let tenant = resolver.get_as::<&str>("tenant")?;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(instance(format!("conn:{tenant}")))
    })
    .unwrap();

    let first = catalog.get("connection").unwrap();
    let again = catalog.get("connection").unwrap();
    assert!(same_instance(&first, &again));

    catalog.update_scope_var("tenant", instance("globex")).unwrap();
    let refreshed = catalog.get_as::<String>("connection").unwrap();

    assert_eq!(refreshed.as_str(), "conn:globex");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scoped_invalidation_is_transitive() {
    let catalog = catalog_with_recipes("app");
    catalog.register_scope_var("tenant", Some(instance(1_usize))).unwrap();
    define(&catalog, "inner", Lifetime::Scoped, |resolver| {
        let tenant = resolver.get_as::<usize>("tenant")?;
        Ok(instance(*tenant * 10))
    })
    .unwrap();
    define(&catalog, "outer", Lifetime::Scoped, |resolver| {
        let inner = resolver.get_as::<usize>("inner")?;
        Ok(instance(*inner + 1))
    })
    .unwrap();

    assert_eq!(get_usize(&catalog, "outer"), 11);
    // Resolve inner alone so outer sees a cache hit next time
    assert_eq!(get_usize(&catalog, "inner"), 10);

    catalog.update_scope_var("tenant", instance(2_usize)).unwrap();

    assert_eq!(get_usize(&catalog, "outer"), 21);
}

#[test]
fn test_scoped_without_scope_var_read_is_a_definition_error() {
    let catalog = catalog_with_recipes("app");
    define(&catalog, "clock", Lifetime::Scoped, |_| Ok(instance(0_u64))).unwrap();

    assert!(matches!(
        catalog.get("clock"),
        Err(Error::DependencyDefinition { .. })
    ));
}

#[test]
fn test_scoped_without_callback_is_a_definition_error() {
    let catalog = catalog_with_recipes("app");
    catalog.register_scope_var("tenant", Some(instance(1_u8))).unwrap();
    define_with(
        &catalog,
        Key::from("session"),
        Lifetime::Scoped,
        recipe(|resolver| resolver.get("tenant")),
        false,
        Vec::new(),
    )
    .unwrap();

    assert!(matches!(
        catalog.get("session"),
        Err(Error::DependencyDefinition { .. })
    ));
}

#[test]
fn test_singleton_reading_scope_var_is_rejected_and_not_cached() {
    let catalog = catalog_with_recipes("app");
    catalog.register_scope_var("tenant", Some(instance(1_u8))).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    define(&catalog, "service", Lifetime::Singleton, move |resolver| {
        counter.fetch_add(1, Ordering::SeqCst);
        resolver.get("tenant")
    })
    .unwrap();

    for _ in 0..2 {
        let error = catalog.get("service").unwrap_err();
        assert!(
            matches!(error, Error::DependencyDefinition { .. }),
            "got {error}"
        );
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_provider_errors_propagate_and_commit_nothing() {
    let catalog = catalog_with_recipes("app");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    define(&catalog, "flaky", Lifetime::Singleton, move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Error::provider("connection refused"))
        } else {
            Ok(instance("connected"))
        }
    })
    .unwrap();

    let error = catalog.get("flaky").unwrap_err();
    assert!(matches!(error, Error::Provider { .. }), "got {error}");

    assert_eq!(*catalog.get_as::<&str>("flaky").unwrap(), "connected");
    assert_eq!(*catalog.get_as::<&str>("flaky").unwrap(), "connected");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
