//! Enum synthesis.
//!
//! An enum class is never built piecewise. The first request for the enum,
//! or for anything declared inside it, builds the whole composite under one
//! registry placeholder:
//!
//! ```text
//! E : Enum<E>
//!     constructor(value: B)     delegates to Enum<E>(), then initializes
//!     property value: B         private field <- param 0, getter returns it
//!     A, B, ...                 each calls the constructor with its literal
//!     values() -> [E]
//!     valueOf(String) -> E
//!     E.Var : EnumVar           storage wrapper, see enum_var.rs
//! ```
//!
//! Any failure unwinds through the session's rollback, so a half-built enum
//! is never observable.

use crate::error::{ConfigurationError, StubError};
use crate::session::StubSession;
use smallvec::smallvec;
use stubir_common::{ConstValue, IntEncoding, Visibility};
use stubir_ir::{
    Accessors, Body, ClassDecl, ConstructorDecl, CtorRef, DeclFlags, DeclId, DeclPayload,
    Declaration, Deferred, EnumEntryDecl, Expr, FieldDecl, FunctionDecl, IrType, Origin, Parent,
    PropertyDecl, Signature, ValueParam, WellKnownClass,
};
use stubir_metadata::{
    AnnotationArg, ClassFlavor, ENUM_ENTRY_VALUE, EntityKind, ForeignDescriptor, ForeignRef,
    MetadataReader,
};
use tracing::{debug, warn};

/// Decode the integral value of an enum entry from its annotation.
///
/// Encodings are tried in fixed priority order; the first annotation
/// present wins.
pub fn decode_entry_value(entity: ForeignRef, desc: &ForeignDescriptor) -> Result<ConstValue, StubError> {
    for encoding in IntEncoding::PRIORITY {
        let fq_name = format!("{ENUM_ENTRY_VALUE}.{}", encoding.tag());
        let Some(annotation) = desc.find_annotation(&fq_name) else {
            continue;
        };
        let raw = annotation
            .arg("value")
            .and_then(AnnotationArg::as_i128)
            .ok_or_else(|| ConfigurationError::Malformed {
                entity,
                reason: format!("{fq_name} has no integral `value` argument"),
            })?;
        return ConstValue::from_i128(encoding, raw).ok_or_else(|| {
            ConfigurationError::ValueOutOfRange {
                entry: desc.name.clone(),
                value: raw,
                encoding,
            }
            .into()
        });
    }
    Err(ConfigurationError::MissingEntryValue {
        entry: desc.name.clone(),
    }
    .into())
}

impl<'r> StubSession<'r> {
    #[tracing::instrument(level = "debug", skip_all, fields(entity = %entity, name = %desc.name))]
    pub(crate) fn synthesize_enum(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
        parent: Option<Parent>,
    ) -> Result<DeclId, StubError> {
        let (parent, attach_to) = match parent {
            Some(Parent::Container(file)) => (Parent::Container(file), Some(file)),
            Some(parent) => (parent, None),
            None => match desc.container {
                Some(owner) => (Parent::Declaration(self.materialize(owner)?), None),
                None => {
                    let package = self.arena.intern(&desc.package);
                    let file = self
                        .options
                        .attach_top_level_enums
                        .then(|| self.package_file_or_create(&desc.package));
                    (Parent::ExternalPackage(package), file)
                }
            },
        };
        if let Some(id) = self.registry.resolve(entity).decl() {
            return Ok(id);
        }

        let name = self.arena.intern(&desc.name);
        let enum_id = self.arena.alloc(
            Declaration::new(
                name,
                Origin::ExternalStub,
                parent,
                DeclPayload::Class(ClassDecl {
                    flavor: ClassFlavor::EnumClass,
                    members: Deferred::Pending,
                    supertypes: Deferred::Ready(vec![IrType::WellKnown(WellKnownClass::Enum)]),
                }),
            )
            .with_foreign(entity)
            .with_visibility(desc.visibility),
        );
        if let Err(existing) = self.registry.reserve(entity, enum_id) {
            return Ok(existing);
        }
        if let Some(file) = attach_to {
            self.arena.attach(file, enum_id);
        }

        let (ctor, backing) = self.enum_constructor(entity, desc, enum_id)?;
        let value = self.enum_value_property(entity, desc, enum_id, ctor, &backing)?;
        let mut members = vec![ctor, value];

        let reader = self.reader;
        for &member in desc.members() {
            let Some(member_desc) = reader.descriptor(member) else {
                continue;
            };
            if member_desc.kind == EntityKind::EnumEntry {
                members.push(self.enum_entry(member, member_desc, enum_id, ctor)?);
            }
        }
        let entries = members.len() - 2;

        members.extend(self.enum_special_members(enum_id));
        members.push(self.synthesize_enum_var(entity, desc, enum_id)?);

        if let DeclPayload::Class(class) = self.payload_mut(enum_id)? {
            class.members = Deferred::Ready(members);
        }
        self.registry.complete(entity);
        self.stats.enums_synthesized += 1;
        debug!(decl_id = %enum_id, entries, "enum synthesized");
        Ok(enum_id)
    }

    // =========================================================================
    // Enum members
    // =========================================================================

    /// Primary constructor: `Enum<E>()` then instance initialization.
    fn enum_constructor(
        &mut self,
        enum_entity: ForeignRef,
        enum_desc: &'r ForeignDescriptor,
        enum_id: DeclId,
    ) -> Result<(DeclId, IrType), StubError> {
        let (ctor_ref, ctor_desc) = self.primary_constructor(enum_entity, enum_desc)?;
        let params = self.translate_params(ctor_desc)?;
        let Some(backing) = params.first().map(|p| p.ty.clone()) else {
            return Err(ConfigurationError::Malformed {
                entity: ctor_ref,
                reason: "enum constructor takes no value parameter".to_string(),
            }
            .into());
        };

        let body = Body::Block(vec![
            Expr::EnumConstructorCall {
                target: CtorRef::WellKnown(WellKnownClass::Enum),
                type_args: smallvec![IrType::Class(enum_id)],
                args: Vec::new(),
            },
            Expr::InstanceInitializerCall { class: enum_id },
        ]);
        let ctor = self.alloc_member(
            &ctor_desc.name,
            Origin::ExternalStub,
            enum_id,
            Some(ctor_ref),
            DeclFlags::PRIMARY,
            DeclPayload::Constructor(ConstructorDecl {
                params: Deferred::Ready(params),
                body: Some(body),
            }),
        );
        Ok((ctor, backing))
    }

    /// Read-only `value` with a private backing field initialized from the
    /// constructor parameter and a getter reading it back.
    fn enum_value_property(
        &mut self,
        enum_entity: ForeignRef,
        enum_desc: &'r ForeignDescriptor,
        enum_id: DeclId,
        ctor: DeclId,
        backing: &IrType,
    ) -> Result<DeclId, StubError> {
        let (prop_ref, prop_desc) = self.enum_member(enum_entity, enum_desc, "value", EntityKind::Property)?;
        let property = self.alloc_member(
            &prop_desc.name,
            Origin::ExternalStub,
            enum_id,
            Some(prop_ref),
            DeclFlags::empty(),
            DeclPayload::Property(PropertyDecl {
                ty: Deferred::Ready(backing.clone()),
                ..PropertyDecl::default()
            }),
        );

        let field_name = self.arena.intern(&prop_desc.name);
        let field = self.arena.alloc(
            Declaration::new(
                field_name,
                Origin::PropertyBackingField,
                Parent::Declaration(property),
                DeclPayload::Field(FieldDecl {
                    ty: Deferred::Ready(backing.clone()),
                    initializer: Some(Expr::GetValueParam {
                        owner: ctor,
                        index: 0,
                    }),
                }),
            )
            .with_visibility(Visibility::Private),
        );

        let getter_ref = prop_desc.property.as_ref().and_then(|p| p.getter);
        let getter = self.synthetic_accessor(
            property,
            getter_ref,
            &format!("<get-{}>", prop_desc.name),
            Signature {
                params: Vec::new(),
                return_type: backing.clone(),
            },
            Some(Body::Expr(Expr::Return(Box::new(Expr::GetField {
                receiver: Box::new(Expr::GetThis { class: enum_id }),
                field,
            })))),
        );

        if let DeclPayload::Property(p) = self.payload_mut(property)? {
            p.backing_field = Some(field);
            p.accessors = Deferred::Ready(Accessors {
                getter: Some(getter),
                setter: None,
            });
        }
        Ok(property)
    }

    fn enum_entry(
        &mut self,
        entry_ref: ForeignRef,
        entry_desc: &'r ForeignDescriptor,
        enum_id: DeclId,
        ctor: DeclId,
    ) -> Result<DeclId, StubError> {
        let value = decode_entry_value(entry_ref, entry_desc)?;
        Ok(self.alloc_member(
            &entry_desc.name,
            Origin::ExternalStub,
            enum_id,
            Some(entry_ref),
            DeclFlags::empty(),
            DeclPayload::EnumEntry(EnumEntryDecl {
                initializer: Some(Expr::EnumConstructorCall {
                    target: CtorRef::Declared(ctor),
                    type_args: smallvec![],
                    args: vec![Expr::Const(value)],
                }),
            }),
        ))
    }

    /// `values()` and `valueOf(value)`. Neither exists in the metadata.
    fn enum_special_members(&mut self, enum_id: DeclId) -> [DeclId; 2] {
        let enum_type = IrType::Class(enum_id);
        let values = self.alloc_member(
            "values",
            Origin::EnumSpecialMember,
            enum_id,
            None,
            DeclFlags::empty(),
            DeclPayload::Function(FunctionDecl {
                signature: Deferred::Ready(Signature {
                    params: Vec::new(),
                    return_type: IrType::Array(Box::new(enum_type.clone())),
                }),
                ..FunctionDecl::default()
            }),
        );
        let param = self.arena.intern("value");
        let value_of = self.alloc_member(
            "valueOf",
            Origin::EnumSpecialMember,
            enum_id,
            None,
            DeclFlags::empty(),
            DeclPayload::Function(FunctionDecl {
                signature: Deferred::Ready(Signature {
                    params: vec![ValueParam {
                        name: param,
                        ty: IrType::WellKnown(WellKnownClass::String),
                    }],
                    return_type: enum_type,
                }),
                ..FunctionDecl::default()
            }),
        );
        [values, value_of]
    }

    // =========================================================================
    // Helpers shared with the storage wrapper
    // =========================================================================

    /// Member of a composite by name and kind.
    pub(crate) fn enum_member(
        &self,
        class: ForeignRef,
        class_desc: &ForeignDescriptor,
        name: &str,
        kind: EntityKind,
    ) -> Result<(ForeignRef, &'r ForeignDescriptor), StubError> {
        let reader = self.reader;
        reader
            .find_member(class, name, kind)
            .and_then(|member| reader.descriptor(member).map(|d| (member, d)))
            .ok_or_else(|| {
                ConfigurationError::MissingMember {
                    class: qualified(reader, class, class_desc),
                    member: name.to_string(),
                }
                .into()
            })
    }

    pub(crate) fn primary_constructor(
        &self,
        class: ForeignRef,
        class_desc: &ForeignDescriptor,
    ) -> Result<(ForeignRef, &'r ForeignDescriptor), StubError> {
        let reader = self.reader;
        class_desc
            .members()
            .iter()
            .filter_map(|&m| reader.descriptor(m).map(|d| (m, d)))
            .find(|(_, d)| d.kind == EntityKind::Constructor && d.is_primary)
            .ok_or_else(|| {
                ConfigurationError::MissingMember {
                    class: qualified(reader, class, class_desc),
                    member: "<init>".to_string(),
                }
                .into()
            })
    }

    /// Allocate a member of `owner` and bind its foreign source, if any.
    pub(crate) fn alloc_member(
        &mut self,
        name: &str,
        origin: Origin,
        owner: DeclId,
        foreign: Option<ForeignRef>,
        flags: DeclFlags,
        payload: DeclPayload,
    ) -> DeclId {
        let name = self.arena.intern(name);
        let mut decl = Declaration::new(name, origin, Parent::Declaration(owner), payload).with_flags(flags);
        if let Some(entity) = foreign {
            decl = decl.with_foreign(entity);
            if let Some(desc) = self.reader.descriptor(entity) {
                decl = decl.with_visibility(desc.visibility);
            }
        }
        let id = self.arena.alloc(decl);
        if let Some(entity) = foreign {
            self.bind_synthesized(entity, id);
        }
        id
    }

    /// Generated getter or setter of `property`.
    pub(crate) fn synthetic_accessor(
        &mut self,
        property: DeclId,
        foreign: Option<ForeignRef>,
        name: &str,
        signature: Signature,
        body: Option<Body>,
    ) -> DeclId {
        let name = self.arena.intern(name);
        let mut decl = Declaration::new(
            name,
            Origin::SyntheticAccessor,
            Parent::Declaration(property),
            DeclPayload::Function(FunctionDecl {
                signature: Deferred::Ready(signature),
                body,
                corresponding_property: Some(property),
            }),
        )
        .with_flags(DeclFlags::DISPATCH_RECEIVER);
        if let Some(entity) = foreign {
            decl = decl.with_foreign(entity);
        }
        let id = self.arena.alloc(decl);
        if let Some(entity) = foreign {
            self.bind_synthesized(entity, id);
        }
        id
    }

    fn bind_synthesized(&mut self, entity: ForeignRef, id: DeclId) {
        if let Err(existing) = self.registry.bind(entity, id) {
            warn!(entity = %entity, decl_id = %id, existing = %existing, "entity already bound");
        }
    }
}

fn qualified(reader: &dyn MetadataReader, entity: ForeignRef, desc: &ForeignDescriptor) -> String {
    let fq_name = reader.fq_name(entity);
    if fq_name.is_empty() {
        desc.name.clone()
    } else {
        fq_name
    }
}
