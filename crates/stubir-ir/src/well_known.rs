//! Runtime classes and constructors the interop layer delegates to.
//!
//! These live in the runtime library, not in foreign metadata, so they are
//! referenced by a closed set of well-known identities instead of by
//! `DeclId`.

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WellKnownClass {
    /// Generic base of every enum class, `Enum<E>`.
    Enum,
    /// Base of enum storage wrappers, `EnumVar(rawPtr)`.
    EnumVar,
    /// Companion base of primitive storage wrappers, `PrimitiveVar.Type(size)`.
    PrimitiveVarType,
    String,
}

impl WellKnownClass {
    pub const fn fq_name(self) -> &'static str {
        match self {
            WellKnownClass::Enum => "stubir.Enum",
            WellKnownClass::EnumVar => "cinterop.EnumVar",
            WellKnownClass::PrimitiveVarType => "cinterop.PrimitiveVar.Type",
            WellKnownClass::String => "stubir.String",
        }
    }

    pub const fn type_param_count(self) -> usize {
        match self {
            WellKnownClass::Enum => 1,
            WellKnownClass::EnumVar | WellKnownClass::PrimitiveVarType | WellKnownClass::String => 0,
        }
    }
}

/// Constructor target of a call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CtorRef {
    Declared(crate::decl::DeclId),
    /// Primary constructor of a runtime class.
    WellKnown(WellKnownClass),
}
