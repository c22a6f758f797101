//! Resolution Engine Tests
//!
//! Tests for catalog resolution through the public API:
//! - Provider registration, visibility and children
//! - Lifetimes and scope variable invalidation
//! - Cycle detection
//! - Test sandboxes and overrides
//! - Concurrent resolution
//! - Provider type registry and dependency tree rendering

mod catalog_tests;
mod cycle_tests;
mod debug_tests;
mod lifetime_tests;
