//! Top-level name disambiguation for materialized declarations.
//!
//! Foreign headers may declare several top-level values with the same name
//! once they are flattened into one package. `NameAmbiguityResolver` runs
//! after construction and gives every such property a unique name.

pub mod resolver;
pub mod scope;
pub mod unique;

pub use resolver::{NameAmbiguityResolver, NameResolverOptions};
pub use scope::TopLevelScope;
pub use unique::UniqueNames;

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod resolver_tests;
