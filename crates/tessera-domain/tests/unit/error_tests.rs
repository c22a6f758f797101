//! Unit tests for the error taxonomy

use tessera_domain::error::Error;
use tessera_domain::key::Key;

#[test]
fn test_not_found_message_names_key() {
    let error = Error::not_found(Key::from("db"));
    assert_eq!(error.to_string(), "Dependency not found: db");
    assert!(error.is_not_found_for(&Key::from("db")));
    assert!(!error.is_not_found_for(&Key::from("cache")));
}

#[test]
fn test_cycle_message_renders_chain() {
    let error = Error::cycle(vec![Key::from("a"), Key::from("b"), Key::from("a")]);
    assert_eq!(error.to_string(), "Dependency cycle: a -> b -> a");

    match error {
        Error::DependencyCycle { chain } => assert_eq!(chain.len(), 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_registration_errors_name_catalog() {
    let duplicate = Error::duplicate_dependency(Key::from("db"), "world");
    assert!(duplicate.to_string().contains("world"));

    let frozen = Error::frozen("world");
    assert_eq!(frozen.to_string(), "Catalog world is frozen");

    let provider = Error::duplicate_provider("values", "world");
    assert!(provider.to_string().contains("values"));
}

#[test]
fn test_provider_error_keeps_source() {
    let io = std::io::Error::other("disk gone");
    let error = Error::provider_with_source("failed to open database", io);

    let source = std::error::Error::source(&error).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("disk gone"));
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
