//! Declaration IR for the stubir interop layer.
//!
//! This crate provides:
//! - `DeclArena`: owner of every declaration and container
//! - `Declaration` with a closed `DeclPayload` per kind
//! - Bodies and expressions for synthesized declarations
//! - `ModuleBuilder` / `BoundModule` two-phase module construction

pub mod arena;
pub mod body;
pub mod container;
pub mod decl;
pub mod module;
pub mod types;
pub mod well_known;

pub use arena::{ArenaCheckpoint, DeclArena};
pub use body::{Body, Expr};
pub use container::{Container, ContainerId, ContainerKind};
pub use decl::{
    Accessors, ClassDecl, ConstructorDecl, DeclFlags, DeclId, DeclKind, DeclPayload, Declaration,
    Deferred, EnumEntryDecl, FieldDecl, FunctionDecl, Origin, Parent, PropertyDecl, Signature,
    TypeAliasDecl, ValueParam,
};
pub use module::{BoundModule, ModuleBuilder, qualified_path};
pub use types::IrType;
pub use well_known::{CtorRef, WellKnownClass};

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod arena_tests;

#[cfg(test)]
#[path = "../tests/module_tests.rs"]
mod module_tests;
