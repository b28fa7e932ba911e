//! Declaration factory.
//!
//! One builder per entity kind. Each produces a shell: name, kind, origin,
//! visibility and parent are final, deep content stays `Deferred` until one
//! of the session's forcing operations asks for it. Stubs never get a body.

use crate::error::{ConfigurationError, StubError, TranslationError};
use crate::session::StubSession;
use std::rc::Rc;
use stubir_ir::{
    ClassDecl, ConstructorDecl, DeclFlags, DeclId, DeclPayload, Declaration, FieldDecl,
    FunctionDecl, IrType, Origin, Parent, PropertyDecl, TypeAliasDecl, ValueParam,
};
use stubir_metadata::{ForeignDescriptor, ForeignRef};
use tracing::trace;

/// Origin of a declaration built straight from its descriptor.
pub(crate) fn stub_origin(desc: &ForeignDescriptor) -> Origin {
    if desc.is_fake_override {
        Origin::FakeOverride
    } else {
        Origin::ExternalStub
    }
}

impl<'r> StubSession<'r> {
    pub(crate) fn build_function(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        let corresponding_property = desc
            .accessor_of
            .map(|property| self.materialize(property))
            .transpose()?;
        let mut flags = DeclFlags::empty();
        if desc.container.is_some() {
            flags |= DeclFlags::DISPATCH_RECEIVER;
        }
        let payload = DeclPayload::Function(FunctionDecl {
            corresponding_property,
            ..FunctionDecl::default()
        });
        self.install(entity, desc, payload, flags)
    }

    pub(crate) fn build_property(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        let mut flags = DeclFlags::empty();
        if desc.property.as_ref().is_some_and(|p| p.is_var) {
            flags |= DeclFlags::MUTABLE;
        }
        self.install(entity, desc, DeclPayload::Property(PropertyDecl::default()), flags)
    }

    pub(crate) fn build_type_alias(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        self.install(
            entity,
            desc,
            DeclPayload::TypeAlias(TypeAliasDecl::default()),
            DeclFlags::empty(),
        )
    }

    pub(crate) fn build_class(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        let Some(class) = desc.class.as_ref() else {
            return Err(ConfigurationError::Malformed {
                entity,
                reason: "class descriptor without class info".to_string(),
            }
            .into());
        };
        let mut flags = DeclFlags::empty();
        if desc.is_companion() {
            flags |= DeclFlags::COMPANION;
        }
        if class.is_objc {
            flags |= DeclFlags::OBJC_CLASS;
        }
        self.install(entity, desc, DeclPayload::Class(ClassDecl::new(class.flavor)), flags)
    }

    pub(crate) fn build_constructor(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        let flags = if desc.is_primary {
            DeclFlags::PRIMARY
        } else {
            DeclFlags::empty()
        };
        self.install(
            entity,
            desc,
            DeclPayload::Constructor(ConstructorDecl::default()),
            flags,
        )
    }

    pub(crate) fn build_field(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<DeclId, StubError> {
        self.install(entity, desc, DeclPayload::Field(FieldDecl::default()), DeclFlags::empty())
    }

    /// Allocate the shell and record it in the registry.
    fn install(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
        payload: DeclPayload,
        flags: DeclFlags,
    ) -> Result<DeclId, StubError> {
        let parent = self.parent_of(desc, &payload)?;
        // Resolving the parent can build this entity (members of composites).
        if let Some(id) = self.registry.resolve(entity).decl() {
            return Ok(id);
        }

        let name = self.arena.intern(&desc.name);
        let decl = Declaration::new(name, stub_origin(desc), parent, payload)
            .with_foreign(entity)
            .with_visibility(desc.visibility)
            .with_flags(flags);
        let id = self.arena.alloc(decl);
        if let Err(existing) = self.registry.bind(entity, id) {
            return Ok(existing);
        }
        self.stats.factory_invocations += 1;
        trace!(entity = %entity, decl_id = %id, kind = ?desc.kind, "factory built shell");
        Ok(id)
    }

    /// Accessors hang off their property, members off their class, and
    /// top-level declarations off their foreign package.
    fn parent_of(&mut self, desc: &ForeignDescriptor, payload: &DeclPayload) -> Result<Parent, StubError> {
        if let DeclPayload::Function(FunctionDecl {
            corresponding_property: Some(property),
            ..
        }) = payload
        {
            return Ok(Parent::Declaration(*property));
        }
        match desc.container {
            Some(owner) => Ok(Parent::Declaration(self.materialize(owner)?)),
            None => Ok(Parent::ExternalPackage(self.arena.intern(&desc.package))),
        }
    }

    // =========================================================================
    // Type translation helpers
    // =========================================================================

    /// Translate the declared type of `desc`.
    pub(crate) fn translate_declared(
        &mut self,
        entity: ForeignRef,
        desc: &'r ForeignDescriptor,
    ) -> Result<IrType, StubError> {
        let ty = desc
            .ty
            .as_ref()
            .ok_or(TranslationError::MissingType { entity })?;
        let translator = Rc::clone(&self.translator);
        Ok(translator.translate(ty, &mut *self)?)
    }

    pub(crate) fn translate_params(&mut self, desc: &'r ForeignDescriptor) -> Result<Vec<ValueParam>, StubError> {
        let translator = Rc::clone(&self.translator);
        let mut params = Vec::with_capacity(desc.params.len());
        for param in &desc.params {
            let ty = translator.translate(&param.ty, &mut *self)?;
            let name = self.arena.intern(&param.name);
            params.push(ValueParam { name, ty });
        }
        Ok(params)
    }
}
