//! Storage wrapper of a synthesized enum.
//!
//! ```text
//! E.Var : EnumVar
//!     constructor(rawPtr: NativePtr)   delegates to EnumVar(rawPtr)
//!     Companion : PrimitiveVar.Type    constructed with the byte width
//!     property value: E                mutable, getter and setter
//! ```

use crate::error::{ConfigurationError, StubError};
use crate::session::StubSession;
use stubir_common::{ConstValue, PrimitiveKind};
use stubir_ir::{
    Accessors, Body, ClassDecl, ConstructorDecl, CtorRef, DeclFlags, DeclId, DeclPayload, Deferred,
    Expr, IrType, Origin, PropertyDecl, Signature, ValueParam, WellKnownClass,
};
use stubir_metadata::{
    AnnotationArg, ClassFlavor, ENUM_VAR_TYPE_SIZE, EntityKind, ForeignDescriptor, ForeignRef,
};
use tracing::trace;

impl<'r> StubSession<'r> {
    pub(crate) fn synthesize_enum_var(
        &mut self,
        enum_entity: ForeignRef,
        enum_desc: &'r ForeignDescriptor,
        enum_id: DeclId,
    ) -> Result<DeclId, StubError> {
        let (var_ref, var_desc) = self.enum_member(enum_entity, enum_desc, "Var", EntityKind::Class)?;
        let var_id = self.alloc_member(
            &var_desc.name,
            Origin::ExternalStub,
            enum_id,
            None,
            DeclFlags::empty(),
            DeclPayload::Class(ClassDecl {
                flavor: ClassFlavor::Class,
                members: Deferred::Pending,
                supertypes: Deferred::Ready(vec![IrType::WellKnown(WellKnownClass::EnumVar)]),
            }),
        );
        if let Some(decl) = self.arena.get_mut(var_id) {
            decl.foreign = Some(var_ref);
            decl.visibility = var_desc.visibility;
        }
        if let Err(existing) = self.registry.reserve(var_ref, var_id) {
            return Ok(existing);
        }

        let ctor = self.enum_var_constructor(var_ref, var_desc, var_id)?;
        let companion = self.enum_var_companion(var_ref, var_desc, var_id)?;
        let value = self.enum_var_value(var_ref, var_desc, var_id)?;

        if let DeclPayload::Class(class) = self.payload_mut(var_id)? {
            class.members = Deferred::Ready(vec![ctor, companion, value]);
        }
        self.registry.complete(var_ref);
        Ok(var_id)
    }

    /// `constructor(rawPtr)`: delegates to `EnumVar(rawPtr)`.
    fn enum_var_constructor(
        &mut self,
        var_ref: ForeignRef,
        var_desc: &'r ForeignDescriptor,
        var_id: DeclId,
    ) -> Result<DeclId, StubError> {
        let (ctor_ref, ctor_desc) = self.primary_constructor(var_ref, var_desc)?;
        let params = self.translate_params(ctor_desc)?;
        if params.first().map(|p| &p.ty) != Some(&IrType::Primitive(PrimitiveKind::NativePtr)) {
            return Err(ConfigurationError::Malformed {
                entity: ctor_ref,
                reason: "storage wrapper constructor must take a raw pointer".to_string(),
            }
            .into());
        }
        let ctor = self.alloc_member(
            &ctor_desc.name,
            Origin::ExternalStub,
            var_id,
            Some(ctor_ref),
            DeclFlags::PRIMARY,
            DeclPayload::Constructor(ConstructorDecl {
                params: Deferred::Ready(params),
                body: None,
            }),
        );
        let body = Body::Block(vec![
            Expr::DelegatingConstructorCall {
                target: CtorRef::WellKnown(WellKnownClass::EnumVar),
                args: vec![Expr::GetValueParam {
                    owner: ctor,
                    index: 0,
                }],
            },
            Expr::InstanceInitializerCall { class: var_id },
        ]);
        if let DeclPayload::Constructor(c) = self.payload_mut(ctor)? {
            c.body = Some(body);
        }
        Ok(ctor)
    }

    /// Companion deriving from `PrimitiveVar.Type`, constructed with the
    /// byte width read from `EnumVarTypeSize`.
    fn enum_var_companion(
        &mut self,
        var_ref: ForeignRef,
        var_desc: &'r ForeignDescriptor,
        var_id: DeclId,
    ) -> Result<DeclId, StubError> {
        let (companion_ref, companion_desc) =
            self.enum_member(var_ref, var_desc, "Companion", EntityKind::Class)?;
        if !companion_desc.is_companion() {
            return Err(ConfigurationError::Malformed {
                entity: companion_ref,
                reason: "storage wrapper companion is not marked as a companion".to_string(),
            }
            .into());
        }
        let size = type_size(companion_ref, companion_desc, || {
            self.reader.fq_name(companion_ref)
        })?;
        let (ctor_ref, ctor_desc) = self.primary_constructor(companion_ref, companion_desc)?;

        let companion = self.alloc_member(
            &companion_desc.name,
            Origin::ExternalStub,
            var_id,
            Some(companion_ref),
            DeclFlags::COMPANION,
            DeclPayload::Class(ClassDecl {
                flavor: ClassFlavor::CompanionObject,
                members: Deferred::Pending,
                supertypes: Deferred::Ready(vec![IrType::WellKnown(WellKnownClass::PrimitiveVarType)]),
            }),
        );
        let body = Body::Block(vec![
            Expr::DelegatingConstructorCall {
                target: CtorRef::WellKnown(WellKnownClass::PrimitiveVarType),
                args: vec![Expr::Const(ConstValue::I32(size))],
            },
            Expr::InstanceInitializerCall { class: companion },
        ]);
        let ctor = self.alloc_member(
            &ctor_desc.name,
            Origin::ExternalStub,
            companion,
            Some(ctor_ref),
            DeclFlags::PRIMARY,
            DeclPayload::Constructor(ConstructorDecl {
                params: Deferred::Ready(Vec::new()),
                body: Some(body),
            }),
        );
        if let DeclPayload::Class(class) = self.payload_mut(companion)? {
            class.members = Deferred::Ready(vec![ctor]);
        }
        trace!(decl_id = %companion, size, "storage wrapper companion");
        Ok(companion)
    }

    /// Mutable `value` of the enum type, with a getter and a setter.
    fn enum_var_value(
        &mut self,
        var_ref: ForeignRef,
        var_desc: &'r ForeignDescriptor,
        var_id: DeclId,
    ) -> Result<DeclId, StubError> {
        let (prop_ref, prop_desc) = self.enum_member(var_ref, var_desc, "value", EntityKind::Property)?;
        // Refers back to the enum, which is still in progress.
        let ty = self.translate_declared(prop_ref, prop_desc)?;
        let info = prop_desc.property.clone().unwrap_or_default();

        let property = self.alloc_member(
            &prop_desc.name,
            Origin::ExternalStub,
            var_id,
            Some(prop_ref),
            DeclFlags::MUTABLE,
            DeclPayload::Property(PropertyDecl {
                ty: Deferred::Ready(ty.clone()),
                ..PropertyDecl::default()
            }),
        );
        let getter = self.synthetic_accessor(
            property,
            info.getter,
            &format!("<get-{}>", prop_desc.name),
            Signature {
                params: Vec::new(),
                return_type: ty.clone(),
            },
            None,
        );
        let setter_param = self.arena.intern("<set-?>");
        let setter = self.synthetic_accessor(
            property,
            info.setter,
            &format!("<set-{}>", prop_desc.name),
            Signature {
                params: vec![ValueParam {
                    name: setter_param,
                    ty,
                }],
                return_type: IrType::UNIT,
            },
            None,
        );

        if let DeclPayload::Property(p) = self.payload_mut(property)? {
            p.accessors = Deferred::Ready(Accessors {
                getter: Some(getter),
                setter: Some(setter),
            });
        }
        Ok(property)
    }
}

/// Byte width from the `EnumVarTypeSize` annotation.
fn type_size(
    entity: ForeignRef,
    desc: &ForeignDescriptor,
    class_name: impl FnOnce() -> String,
) -> Result<i32, StubError> {
    let Some(annotation) = desc.find_annotation(ENUM_VAR_TYPE_SIZE) else {
        return Err(ConfigurationError::MissingTypeSize { class: class_name() }.into());
    };
    annotation
        .arg("size")
        .and_then(AnnotationArg::as_i128)
        .and_then(|size| i32::try_from(size).ok())
        .ok_or_else(|| {
            ConfigurationError::Malformed {
                entity,
                reason: "EnumVarTypeSize size is not a 32-bit integer".to_string(),
            }
            .into()
        })
}
