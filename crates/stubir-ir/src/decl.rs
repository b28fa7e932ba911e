//! Declaration nodes.
//!
//! Every declaration is one `Declaration` in the `DeclArena`, addressed by
//! `DeclId`. The kind is not a type hierarchy: it is the tag of the closed
//! `DeclPayload` enum, so adding a kind means adding a variant and fixing
//! every exhaustive match.
//!
//! Name, kind, origin and parent are set when the node is allocated and are
//! valid immediately, even while the provider is still building the node.
//! Deep content (types, signatures, class members, accessors) is held in
//! `Deferred` slots and forced on demand.

use crate::body::{Body, Expr};
use crate::container::ContainerId;
use crate::types::IrType;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;
use stubir_common::{Atom, Visibility};
use stubir_metadata::{ClassFlavor, ForeignRef};

/// Index of a declaration in its `DeclArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Declaration kind tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Function,
    Property,
    Class,
    TypeAlias,
    Constructor,
    Field,
    EnumEntry,
    /// Local variable or value parameter of a source declaration.
    Variable,
    /// `init { }` block of a source class.
    AnonymousInitializer,
    /// Delegated property local to a function body.
    LocalDelegatedProperty,
}

impl DeclKind {
    pub const fn is_classifier(self) -> bool {
        matches!(self, DeclKind::Class | DeclKind::TypeAlias)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Property => "property",
            DeclKind::Class => "class",
            DeclKind::TypeAlias => "type-alias",
            DeclKind::Constructor => "constructor",
            DeclKind::Field => "field",
            DeclKind::EnumEntry => "enum-entry",
            DeclKind::Variable => "variable",
            DeclKind::AnonymousInitializer => "initializer",
            DeclKind::LocalDelegatedProperty => "local-delegate",
        }
    }
}

/// Why a declaration exists. Code generation keys off this: stubs get no
/// body, synthetic accessors get a generated one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Origin {
    /// Declared in foreign metadata, no body.
    ExternalStub,
    /// Inherited from a supertype without being redeclared.
    FakeOverride,
    /// Generated getter/setter of a synthesized property.
    SyntheticAccessor,
    /// Storage of a synthesized property.
    PropertyBackingField,
    /// `values()` / `valueOf()` of a synthesized enum.
    EnumSpecialMember,
    /// Ordinary declaration compiled from source.
    Source,
}

/// Lexical owner of a declaration. Back-reference only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Parent {
    Container(ContainerId),
    Declaration(DeclId),
    /// Package of a foreign library that is not part of the module.
    ExternalPackage(Atom),
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeclFlags: u16 {
        /// Primary constructor.
        const PRIMARY = 1 << 0;
        /// Companion object of its class.
        const COMPANION = 1 << 1;
        /// Bridged Objective-C class.
        const OBJC_CLASS = 1 << 2;
        /// `var` property or mutable field.
        const MUTABLE = 1 << 3;
        /// Member function taking `this`.
        const DISPATCH_RECEIVER = 1 << 4;
    }
}

/// Content that is computed on first access.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Deferred<T> {
    #[default]
    Pending,
    Ready(T),
}

impl<T> Deferred<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Deferred::Pending => None,
            Deferred::Ready(v) => Some(v),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Deferred::Ready(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueParam {
    pub name: Atom,
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub params: Vec<ValueParam>,
    pub return_type: IrType,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionDecl {
    pub signature: Deferred<Signature>,
    pub body: Option<Body>,
    /// Owning property when this function is a getter or setter.
    pub corresponding_property: Option<DeclId>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Accessors {
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDecl {
    pub ty: Deferred<IrType>,
    pub backing_field: Option<DeclId>,
    pub accessors: Deferred<Accessors>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub flavor: ClassFlavor,
    pub members: Deferred<Vec<DeclId>>,
    pub supertypes: Deferred<Vec<IrType>>,
}

impl ClassDecl {
    pub fn new(flavor: ClassFlavor) -> Self {
        Self {
            flavor,
            members: Deferred::Pending,
            supertypes: Deferred::Pending,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeAliasDecl {
    pub expanded: Deferred<IrType>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstructorDecl {
    pub params: Deferred<Vec<ValueParam>>,
    pub body: Option<Body>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDecl {
    pub ty: Deferred<IrType>,
    pub initializer: Option<Expr>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumEntryDecl {
    pub initializer: Option<Expr>,
}

/// Kind-specific part of a declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclPayload {
    Function(FunctionDecl),
    Property(PropertyDecl),
    Class(ClassDecl),
    TypeAlias(TypeAliasDecl),
    Constructor(ConstructorDecl),
    Field(FieldDecl),
    EnumEntry(EnumEntryDecl),
    Variable,
    AnonymousInitializer,
    LocalDelegatedProperty,
}

impl DeclPayload {
    pub const fn kind(&self) -> DeclKind {
        match self {
            DeclPayload::Function(_) => DeclKind::Function,
            DeclPayload::Property(_) => DeclKind::Property,
            DeclPayload::Class(_) => DeclKind::Class,
            DeclPayload::TypeAlias(_) => DeclKind::TypeAlias,
            DeclPayload::Constructor(_) => DeclKind::Constructor,
            DeclPayload::Field(_) => DeclKind::Field,
            DeclPayload::EnumEntry(_) => DeclKind::EnumEntry,
            DeclPayload::Variable => DeclKind::Variable,
            DeclPayload::AnonymousInitializer => DeclKind::AnonymousInitializer,
            DeclPayload::LocalDelegatedProperty => DeclKind::LocalDelegatedProperty,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: Atom,
    pub visibility: Visibility,
    pub origin: Origin,
    pub parent: Parent,
    /// Foreign entity this node was materialized from.
    pub foreign: Option<ForeignRef>,
    pub flags: DeclFlags,
    pub payload: DeclPayload,
}

impl Declaration {
    pub fn new(name: Atom, origin: Origin, parent: Parent, payload: DeclPayload) -> Self {
        Self {
            name,
            visibility: Visibility::Public,
            origin,
            parent,
            foreign: None,
            flags: DeclFlags::empty(),
            payload,
        }
    }

    pub fn with_foreign(mut self, foreign: ForeignRef) -> Self {
        self.foreign = Some(foreign);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_flags(mut self, flags: DeclFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub const fn kind(&self) -> DeclKind {
        self.payload.kind()
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.payload {
            DeclPayload::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyDecl> {
        match &self.payload {
            DeclPayload::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.payload {
            DeclPayload::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_constructor(&self) -> Option<&ConstructorDecl> {
        match &self.payload {
            DeclPayload::Constructor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldDecl> {
        match &self.payload {
            DeclPayload::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enum_entry(&self) -> Option<&EnumEntryDecl> {
        match &self.payload {
            DeclPayload::EnumEntry(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_type_alias(&self) -> Option<&TypeAliasDecl> {
        match &self.payload {
            DeclPayload::TypeAlias(t) => Some(t),
            _ => None,
        }
    }

    /// Getter or setter of a property.
    pub fn is_property_accessor(&self) -> bool {
        self.as_function()
            .is_some_and(|f| f.corresponding_property.is_some())
    }

    /// Declarations that only make sense inside one compilation.
    pub fn is_local(&self) -> bool {
        self.origin == Origin::FakeOverride
            || !self.visibility.is_exported()
            || matches!(
                self.kind(),
                DeclKind::Variable | DeclKind::AnonymousInitializer | DeclKind::LocalDelegatedProperty
            )
    }
}
