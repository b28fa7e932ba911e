//! Provider errors.
//!
//! Nothing here is retryable. A failed materialization leaves the session
//! exactly as it was before the outermost request.

use stubir_common::IntEncoding;
use stubir_ir::{DeclId, DeclKind};
use stubir_metadata::{EntityKind, ForeignRef};
use thiserror::Error;

/// Top-level error of every provider operation.
#[derive(Debug, Error)]
pub enum StubError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Identity(#[from] IdentityViolation),
    #[error(transparent)]
    Misuse(#[from] CallerMisuse),
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

/// The foreign metadata does not have the shape the provider expects.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("entity {entity} has unsupported kind {kind:?}")]
    UnsupportedKind { entity: ForeignRef, kind: EntityKind },
    #[error("enum entry `{entry}` carries no EnumEntryValue annotation")]
    MissingEntryValue { entry: String },
    #[error("enum entry `{entry}` value {value} does not fit {encoding:?}")]
    ValueOutOfRange {
        entry: String,
        value: i128,
        encoding: IntEncoding,
    },
    #[error("`{class}` has no member `{member}`")]
    MissingMember { class: String, member: String },
    #[error("`{class}` carries no EnumVarTypeSize annotation")]
    MissingTypeSize { class: String },
    #[error("malformed descriptor {entity}: {reason}")]
    Malformed { entity: ForeignRef, reason: String },
}

#[derive(Debug, Error)]
pub enum IdentityViolation {
    #[error("foreign declaration `{name}` ({entity}) has no precomputed identity")]
    MissingUniqId { name: String, entity: ForeignRef },
}

/// The caller asked for something the provider must not do.
#[derive(Debug, Error)]
pub enum CallerMisuse {
    #[error("entity {0} is unknown to the metadata reader")]
    UnknownEntity(ForeignRef),
    #[error("entity {entity} comes from `{library}`, which is not an interop library")]
    NotInterop { entity: ForeignRef, library: String },
    #[error("entity {entity} (`{fq_name}`) is handled by a dedicated path")]
    SpecialCased { entity: ForeignRef, fq_name: String },
    #[error("entity {entity} is not an enum class")]
    NotAnEnum { entity: ForeignRef },
    #[error("declaration {0} does not exist")]
    UnknownDecl(DeclId),
    #[error("declaration {decl} is a {found:?}, expected {expected}")]
    WrongKind {
        decl: DeclId,
        expected: &'static str,
        found: DeclKind,
    },
    #[error("declaration {0} has no foreign source to compute content from")]
    NoForeignSource(DeclId),
    #[error("container {0} does not exist")]
    UnknownContainer(u32),
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("type `{0}` cannot be translated")]
    Unsupported(String),
    #[error("type references entity {entity}, which could not be materialized")]
    Class {
        entity: ForeignRef,
        #[source]
        source: Box<StubError>,
    },
    #[error("entity {entity} has no declared type")]
    MissingType { entity: ForeignRef },
}
