//! Foreign metadata model for the stubir interop layer.
//!
//! The real metadata reader lives outside this workspace; this crate
//! defines the descriptor model it hands out, the `MetadataReader` trait
//! the provider consumes, and an in-memory reader (`MetadataIndex`) that
//! can be assembled with `MetadataBuilder` or loaded from a JSON manifest.

pub mod builder;
pub mod entity;
pub mod manifest;
pub mod reader;

pub use builder::{MetadataBuilder, stable_uniq_id};
pub use entity::{
    Annotation, AnnotationArg, ClassFlavor, ClassInfo, DescriptorOrigin, ENUM_ENTRY_VALUE,
    ENUM_VAR_TYPE_SIZE, EntityKind, ForeignDescriptor, ForeignParam, ForeignRef, ForeignType,
    PropertyInfo,
};
pub use manifest::Manifest;
pub use reader::{MetadataIndex, MetadataReader};

use stubir_common::{IntEncoding, PrimitiveKind};

/// Errors raised while assembling metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("invalid manifest: {0}")]
    Manifest(#[source] serde_json::Error),
    #[error("unknown type `{name}` referenced from package `{package}`")]
    UnknownType { package: String, name: String },
    #[error("enum `{name}` is backed by non-integral type `{backing}`")]
    NonIntegralEnumBacking { name: String, backing: PrimitiveKind },
    #[error("enum entry `{entry}` value {value} does not fit {encoding:?}")]
    EntryValueOutOfRange {
        entry: String,
        value: i128,
        encoding: IntEncoding,
    },
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod builder_tests;

#[cfg(test)]
#[path = "../tests/manifest_tests.rs"]
mod manifest_tests;
