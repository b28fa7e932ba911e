//! Internal types, as produced by the type translation service.

use crate::decl::DeclId;
use crate::well_known::WellKnownClass;
use std::fmt;
use stubir_common::PrimitiveKind;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Primitive(PrimitiveKind),
    /// Classifier declared in the arena.
    Class(DeclId),
    /// Runtime class the interop layer builds on.
    WellKnown(WellKnownClass),
    Pointer(Box<IrType>),
    Array(Box<IrType>),
}

impl IrType {
    pub const UNIT: IrType = IrType::Primitive(PrimitiveKind::Unit);

    pub fn class_id(&self) -> Option<DeclId> {
        match self {
            IrType::Class(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Primitive(kind) => write!(f, "{kind}"),
            IrType::Class(id) => write!(f, "class({id})"),
            IrType::WellKnown(class) => f.write_str(class.fq_name()),
            IrType::Pointer(inner) => write!(f, "*{inner}"),
            IrType::Array(inner) => write!(f, "Array<{inner}>"),
        }
    }
}
