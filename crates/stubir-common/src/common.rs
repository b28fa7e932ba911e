//! Vocabulary shared by the metadata model, the declaration IR and the
//! provider. Kept here so the lower crates do not depend on each other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration visibility as recorded in foreign metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
    /// Visible only inside the enclosing function body.
    Local,
}

impl Visibility {
    /// Whether a declaration with this visibility can be referenced from
    /// another compilation.
    pub const fn is_exported(self) -> bool {
        !matches!(self, Visibility::Private | Visibility::Local)
    }
}

/// Primitive types a foreign library can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Unit,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Untyped native pointer.
    NativePtr,
}

impl PrimitiveKind {
    /// Storage size in bytes. `Unit` has no storage.
    pub const fn byte_width(self) -> u32 {
        match self {
            PrimitiveKind::Unit => 0,
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
            PrimitiveKind::NativePtr => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Unit => "unit",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::NativePtr => "nativeptr",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer encodings an enum entry constant may be tagged with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntEncoding {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntEncoding {
    /// Order in which entry annotations are probed; the first present wins.
    pub const PRIORITY: [IntEncoding; 8] = [
        IntEncoding::I8,
        IntEncoding::I16,
        IntEncoding::I32,
        IntEncoding::I64,
        IntEncoding::U8,
        IntEncoding::U16,
        IntEncoding::U32,
        IntEncoding::U64,
    ];

    /// Suffix used in annotation names (`EnumEntryValue.I32`).
    pub const fn tag(self) -> &'static str {
        match self {
            IntEncoding::I8 => "I8",
            IntEncoding::I16 => "I16",
            IntEncoding::I32 => "I32",
            IntEncoding::I64 => "I64",
            IntEncoding::U8 => "U8",
            IntEncoding::U16 => "U16",
            IntEncoding::U32 => "U32",
            IntEncoding::U64 => "U64",
        }
    }

    pub const fn primitive(self) -> PrimitiveKind {
        match self {
            IntEncoding::I8 => PrimitiveKind::I8,
            IntEncoding::I16 => PrimitiveKind::I16,
            IntEncoding::I32 => PrimitiveKind::I32,
            IntEncoding::I64 => PrimitiveKind::I64,
            IntEncoding::U8 => PrimitiveKind::U8,
            IntEncoding::U16 => PrimitiveKind::U16,
            IntEncoding::U32 => PrimitiveKind::U32,
            IntEncoding::U64 => PrimitiveKind::U64,
        }
    }

    pub const fn byte_width(self) -> u32 {
        self.primitive().byte_width()
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            IntEncoding::I8 | IntEncoding::I16 | IntEncoding::I32 | IntEncoding::I64
        )
    }

    /// Encoding for an integral primitive, `None` for everything else.
    pub const fn for_primitive(kind: PrimitiveKind) -> Option<IntEncoding> {
        match kind {
            PrimitiveKind::I8 => Some(IntEncoding::I8),
            PrimitiveKind::I16 => Some(IntEncoding::I16),
            PrimitiveKind::I32 => Some(IntEncoding::I32),
            PrimitiveKind::I64 => Some(IntEncoding::I64),
            PrimitiveKind::U8 => Some(IntEncoding::U8),
            PrimitiveKind::U16 => Some(IntEncoding::U16),
            PrimitiveKind::U32 => Some(IntEncoding::U32),
            PrimitiveKind::U64 => Some(IntEncoding::U64),
            _ => None,
        }
    }
}

/// A typed integer literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl ConstValue {
    pub const fn encoding(self) -> IntEncoding {
        match self {
            ConstValue::I8(_) => IntEncoding::I8,
            ConstValue::I16(_) => IntEncoding::I16,
            ConstValue::I32(_) => IntEncoding::I32,
            ConstValue::I64(_) => IntEncoding::I64,
            ConstValue::U8(_) => IntEncoding::U8,
            ConstValue::U16(_) => IntEncoding::U16,
            ConstValue::U32(_) => IntEncoding::U32,
            ConstValue::U64(_) => IntEncoding::U64,
        }
    }

    /// Widened value, lossless for every encoding.
    pub const fn as_i128(self) -> i128 {
        match self {
            ConstValue::I8(v) => v as i128,
            ConstValue::I16(v) => v as i128,
            ConstValue::I32(v) => v as i128,
            ConstValue::I64(v) => v as i128,
            ConstValue::U8(v) => v as i128,
            ConstValue::U16(v) => v as i128,
            ConstValue::U32(v) => v as i128,
            ConstValue::U64(v) => v as i128,
        }
    }

    /// Narrow `raw` into `encoding`, `None` when it does not fit.
    pub fn from_i128(encoding: IntEncoding, raw: i128) -> Option<ConstValue> {
        Some(match encoding {
            IntEncoding::I8 => ConstValue::I8(i8::try_from(raw).ok()?),
            IntEncoding::I16 => ConstValue::I16(i16::try_from(raw).ok()?),
            IntEncoding::I32 => ConstValue::I32(i32::try_from(raw).ok()?),
            IntEncoding::I64 => ConstValue::I64(i64::try_from(raw).ok()?),
            IntEncoding::U8 => ConstValue::U8(u8::try_from(raw).ok()?),
            IntEncoding::U16 => ConstValue::U16(u16::try_from(raw).ok()?),
            IntEncoding::U32 => ConstValue::U32(u32::try_from(raw).ok()?),
            IntEncoding::U64 => ConstValue::U64(u64::try_from(raw).ok()?),
        })
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.as_i128(), self.encoding().tag().to_lowercase())
    }
}
