//! Foreign entity descriptors.
//!
//! A `ForeignDescriptor` is everything the metadata reader knows about one
//! foreign entity. Descriptors are immutable once the reader is built; the
//! provider only ever reads them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use stubir_common::{PrimitiveKind, Visibility};

/// Annotation carried by every enum entry: `EnumEntryValue.<encoding>(value)`.
pub const ENUM_ENTRY_VALUE: &str = "cinterop.internal.EnumEntryValue";
/// Annotation carried by an enum's storage wrapper companion: `EnumVarTypeSize(size)`.
pub const ENUM_VAR_TYPE_SIZE: &str = "cinterop.internal.EnumVarTypeSize";

/// Opaque handle for a foreign entity.
///
/// Handles are indices into the reader that produced them. Two handles are
/// the same entity iff they are equal; the descriptor content is never
/// compared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForeignRef(pub u32);

impl fmt::Display for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a foreign entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Function,
    Property,
    TypeAlias,
    Class,
    Constructor,
    Field,
    EnumEntry,
    ValueParameter,
    TypeParameter,
}

/// Where a descriptor was loaded from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorOrigin {
    /// A metadata-based interop library (generated from native headers).
    Interop { library: String },
    /// A library compiled from source.
    Source { module: String },
}

impl DescriptorOrigin {
    pub fn is_from_interop_library(&self) -> bool {
        matches!(self, DescriptorOrigin::Interop { .. })
    }

    pub fn library_name(&self) -> &str {
        match self {
            DescriptorOrigin::Interop { library } => library,
            DescriptorOrigin::Source { module } => module,
        }
    }
}

/// A type as written in foreign metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForeignType {
    Primitive(PrimitiveKind),
    /// Reference to a classifier described by the same reader.
    Entity(ForeignRef),
    Pointer(Box<ForeignType>),
    /// A type the metadata could not express; translating it fails.
    Unsupported(String),
}

impl ForeignType {
    pub const fn unit() -> Self {
        ForeignType::Primitive(PrimitiveKind::Unit)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignParam {
    pub name: String,
    pub ty: ForeignType,
}

impl ForeignParam {
    pub fn new(name: impl Into<String>, ty: ForeignType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Shape of a foreign classifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassFlavor {
    Class,
    Interface,
    Object,
    CompanionObject,
    EnumClass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    pub flavor: ClassFlavor,
    /// Bridges an Objective-C class; such classes live in a synthetic file
    /// of their package.
    pub is_objc: bool,
    /// Member entities in declaration order.
    pub members: Vec<ForeignRef>,
    pub supertypes: Vec<ForeignType>,
}

impl ClassInfo {
    pub fn new(flavor: ClassFlavor) -> Self {
        Self {
            flavor,
            is_objc: false,
            members: Vec::new(),
            supertypes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyInfo {
    pub is_var: bool,
    pub getter: Option<ForeignRef>,
    pub setter: Option<ForeignRef>,
}

/// Annotation argument value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationArg {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Str(String),
}

impl AnnotationArg {
    /// Integral value of the argument, if it is one.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            AnnotationArg::Int(v) => Some(i128::from(*v)),
            AnnotationArg::UInt(v) => Some(i128::from(*v)),
            AnnotationArg::Bool(_) | AnnotationArg::Str(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub fq_name: String,
    pub args: SmallVec<[(String, AnnotationArg); 1]>,
}

impl Annotation {
    pub fn new(fq_name: impl Into<String>) -> Self {
        Self {
            fq_name: fq_name.into(),
            args: SmallVec::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: AnnotationArg) -> Self {
        self.args.push((name.into(), value));
        self
    }

    pub fn arg(&self, name: &str) -> Option<&AnnotationArg> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Everything the reader knows about one foreign entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignDescriptor {
    pub kind: EntityKind,
    pub name: String,
    /// Dotted package name (`platform.posix`).
    pub package: String,
    pub origin: DescriptorOrigin,
    /// Owning classifier for members, `None` at top level.
    pub container: Option<ForeignRef>,
    pub visibility: Visibility,
    /// Return type for functions, declared type for properties and fields,
    /// expansion for type aliases.
    pub ty: Option<ForeignType>,
    pub params: Vec<ForeignParam>,
    pub class: Option<ClassInfo>,
    pub property: Option<PropertyInfo>,
    /// Set on getter/setter functions.
    pub accessor_of: Option<ForeignRef>,
    /// Inherited member that the class does not redeclare.
    pub is_fake_override: bool,
    /// Primary constructor of its class.
    pub is_primary: bool,
    /// Cross-compilation identity precomputed when the library was built.
    pub uniq_id: Option<u64>,
    pub annotations: Vec<Annotation>,
}

impl ForeignDescriptor {
    pub fn new(
        kind: EntityKind,
        name: impl Into<String>,
        package: impl Into<String>,
        origin: DescriptorOrigin,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            package: package.into(),
            origin,
            container: None,
            visibility: Visibility::Public,
            ty: None,
            params: Vec::new(),
            class: None,
            property: None,
            accessor_of: None,
            is_fake_override: false,
            is_primary: false,
            uniq_id: None,
            annotations: Vec::new(),
        }
    }

    pub fn find_annotation(&self, fq_name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.fq_name == fq_name)
    }

    pub fn is_class_flavor(&self, flavor: ClassFlavor) -> bool {
        self.class.as_ref().is_some_and(|c| c.flavor == flavor)
    }

    pub fn is_enum_class(&self) -> bool {
        self.is_class_flavor(ClassFlavor::EnumClass)
    }

    pub fn is_companion(&self) -> bool {
        self.is_class_flavor(ClassFlavor::CompanionObject)
    }

    pub fn is_objc_class(&self) -> bool {
        self.class.as_ref().is_some_and(|c| c.is_objc)
    }

    pub fn members(&self) -> &[ForeignRef] {
        self.class.as_ref().map_or(&[], |c| c.members.as_slice())
    }
}
