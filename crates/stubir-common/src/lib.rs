//! Common types and utilities for the stubir interop declaration layer.
//!
//! This crate provides foundational types used across all stubir crates:
//! - String interning (`Atom`, `Interner`)
//! - Shared vocabulary (`Visibility`, `PrimitiveKind`, `ConstValue`, `IntEncoding`)

// String interning for declaration names
pub mod interner;
pub use interner::{Atom, Interner};

// Shared vocabulary used by metadata, IR and the provider
pub mod common;
pub use common::{ConstValue, IntEncoding, PrimitiveKind, Visibility};
