//! Demand-driven materialization of foreign declarations.
//!
//! Given a handle to a foreign entity, `StubSession::materialize` produces
//! exactly one declaration for it, on first use:
//! - `registry`: foreign entity to declaration, with in-progress placeholders
//! - `factory`: per-kind shells with deferred content
//! - `enum_class` / `enum_var`: composite enum synthesis from annotations
//! - `session`: dispatch, forcing of deferred content, rollback

pub mod enum_class;
mod enum_var;
pub mod error;
mod factory;
pub mod options;
pub mod registry;
pub mod session;
pub mod translate;

pub use enum_class::decode_entry_value;
pub use error::{CallerMisuse, ConfigurationError, IdentityViolation, StubError, TranslationError};
pub use options::ProviderOptions;
pub use registry::{IdentityRegistry, Resolution};
pub use session::{SessionStats, SpecialCase, StubSession};
pub use translate::{ClassSymbolResolver, DefaultTypeTranslator, TypeTranslator};

#[cfg(test)]
#[path = "../tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "../tests/enum_tests.rs"]
mod enum_tests;
