//! stubir: demand-driven materialization of foreign interop declarations.
//!
//! Declarations described by an interop library's metadata are turned into
//! IR nodes only when something asks for them. The crates are layered:
//!
//! - [`common`]: interned names and shared value types
//! - [`metadata`]: descriptor model, reader trait and manifest loader
//! - [`ir`]: declaration arena and module construction
//! - [`provider`]: the materialization session (registry, dispatcher,
//!   factory and enum synthesis)
//! - [`names`]: top-level name disambiguation
//! - [`serialization`]: stable identities for export

pub use stubir_common as common;
pub use stubir_ir as ir;
pub use stubir_metadata as metadata;
pub use stubir_names as names;
pub use stubir_provider as provider;
pub use stubir_serialization as serialization;

pub use stubir_provider::{ProviderOptions, StubError, StubSession};

#[cfg(feature = "cli")]
pub mod cli;

pub mod tracing_config;
