//! Materialization dispatcher.
//!
//! `StubSession` owns everything one compilation unit needs to turn foreign
//! entities into declarations: the arena, the identity registry, the
//! per-package file map and the module under construction. The rest of the
//! compiler calls `materialize` whenever it dereferences a foreign entity;
//! the session routes the request to the declaration factory or the enum
//! synthesizer and memoizes the result.
//!
//! Every public entry point is atomic. If the outermost request fails, the
//! arena, the registry, the package map and the module file list are
//! restored to their state before the request.

use crate::error::{CallerMisuse, ConfigurationError, StubError};
use crate::options::ProviderOptions;
use crate::registry::{IdentityRegistry, RegistryCheckpoint, Resolution};
use crate::translate::{ClassSymbolResolver, DefaultTypeTranslator, TypeTranslator};
use indexmap::IndexMap;
use serde::Serialize;
use std::rc::Rc;
use stubir_common::{Atom, Visibility};
use stubir_ir::{
    Accessors, ArenaCheckpoint, BoundModule, ClassDecl, ConstructorDecl, ContainerId,
    ContainerKind, DeclArena, DeclId, DeclKind, DeclPayload, Declaration, Deferred,
    EnumEntryDecl, FieldDecl, FunctionDecl, IrType, ModuleBuilder, Origin, Parent, PropertyDecl,
    Signature, TypeAliasDecl,
};
use stubir_metadata::{ClassFlavor, EntityKind, ForeignDescriptor, ForeignRef, MetadataReader};
use tracing::{debug, trace, warn};

/// Predicate for entities that have a dedicated materialization path
/// elsewhere and must never go through the session.
pub type SpecialCase<'r> = Box<dyn Fn(ForeignRef, &ForeignDescriptor) -> bool + 'r>;

/// Counters for one session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Declarations built by the factory from a descriptor.
    pub factory_invocations: u32,
    /// Requests answered by the registry.
    pub registry_hits: u32,
    pub enums_synthesized: u32,
    pub rollbacks: u32,
}

struct Checkpoint {
    arena: ArenaCheckpoint,
    registry: RegistryCheckpoint,
    stats: SessionStats,
}

pub struct StubSession<'r> {
    pub(crate) reader: &'r dyn MetadataReader,
    pub(crate) translator: Rc<dyn TypeTranslator + 'r>,
    special_case: Option<SpecialCase<'r>>,
    pub(crate) options: ProviderOptions,
    pub(crate) arena: DeclArena,
    pub(crate) registry: IdentityRegistry,
    package_files: IndexMap<Atom, ContainerId>,
    module: ModuleBuilder,
    pub(crate) stats: SessionStats,
    depth: u32,
}

impl<'r> StubSession<'r> {
    pub fn new(module_name: impl Into<String>, reader: &'r dyn MetadataReader) -> Self {
        Self {
            reader,
            translator: Rc::new(DefaultTypeTranslator),
            special_case: None,
            options: ProviderOptions::default(),
            arena: DeclArena::new(),
            registry: IdentityRegistry::new(),
            package_files: IndexMap::new(),
            module: ModuleBuilder::new(module_name),
            stats: SessionStats::default(),
            depth: 0,
        }
    }

    pub fn with_translator(mut self, translator: impl TypeTranslator + 'r) -> Self {
        self.translator = Rc::new(translator);
        self
    }

    pub fn with_special_case(
        mut self,
        predicate: impl Fn(ForeignRef, &ForeignDescriptor) -> bool + 'r,
    ) -> Self {
        self.special_case = Some(Box::new(predicate));
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// File containers created so far, in creation order.
    pub fn files(&self) -> &[ContainerId] {
        self.module.files()
    }

    /// Per-package file holding bridged classes, if one was created.
    pub fn package_file(&self, package: &str) -> Option<ContainerId> {
        let atom = self.arena.interner().get(package)?;
        self.package_files.get(&atom).copied()
    }

    /// Registry status of `entity`, without materializing it.
    pub fn resolve(&self, entity: ForeignRef) -> Resolution {
        self.registry.resolve(entity)
    }

    /// Consume the session and bind the module.
    pub fn finish(self) -> BoundModule {
        debug!(
            factory_invocations = self.stats.factory_invocations,
            registry_hits = self.stats.registry_hits,
            rollbacks = self.stats.rollbacks,
            "StubSession::finish"
        );
        self.module.bind(self.arena)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// The declaration for `entity`, building it on first use.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = %entity))]
    pub fn materialize(&mut self, entity: ForeignRef) -> Result<DeclId, StubError> {
        if let Some(id) = self.registry_hit(entity) {
            return Ok(id);
        }
        let desc = self.checked_descriptor(entity)?;
        self.atomically(|session| session.dispatch(entity, desc))
    }

    /// Enum entry point for callers that supply the lexical parent
    /// themselves. The enum is attached to `parent` when it is built here.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = %entity))]
    pub fn find_or_generate_enum(
        &mut self,
        entity: ForeignRef,
        parent: ContainerId,
    ) -> Result<DeclId, StubError> {
        if let Some(id) = self.registry_hit(entity) {
            return Ok(id);
        }
        let desc = self.checked_descriptor(entity)?;
        if !desc.is_enum_class() {
            return Err(CallerMisuse::NotAnEnum { entity }.into());
        }
        if self.arena.container(parent).is_none() {
            return Err(CallerMisuse::UnknownContainer(parent.0).into());
        }
        self.atomically(|session| {
            session.synthesize_enum(entity, desc, Some(Parent::Container(parent)))
        })
    }

    fn registry_hit(&mut self, entity: ForeignRef) -> Option<DeclId> {
        let id = self.registry.resolve(entity).decl()?;
        self.stats.registry_hits += 1;
        trace!(entity = %entity, decl_id = %id, "registry hit");
        Some(id)
    }

    /// Descriptor of an entity the session may materialize.
    fn checked_descriptor(&self, entity: ForeignRef) -> Result<&'r ForeignDescriptor, StubError> {
        let reader = self.reader;
        let desc = reader
            .descriptor(entity)
            .ok_or(CallerMisuse::UnknownEntity(entity))?;
        if !desc.origin.is_from_interop_library() {
            return Err(CallerMisuse::NotInterop {
                entity,
                library: desc.origin.library_name().to_string(),
            }
            .into());
        }
        if self.is_special_cased(entity, desc) {
            return Err(CallerMisuse::SpecialCased {
                entity,
                fq_name: reader.fq_name(entity),
            }
            .into());
        }
        Ok(desc)
    }

    pub(crate) fn is_special_cased(&self, entity: ForeignRef, desc: &ForeignDescriptor) -> bool {
        self.special_case
            .as_ref()
            .is_some_and(|predicate| predicate(entity, desc))
    }

    fn dispatch(&mut self, entity: ForeignRef, desc: &'r ForeignDescriptor) -> Result<DeclId, StubError> {
        if let Some(owner) = self.enclosing_enum(desc) {
            return self.materialize_enum_member(entity, owner);
        }
        match desc.kind {
            EntityKind::Class if desc.is_enum_class() => self.synthesize_enum(entity, desc, None),
            EntityKind::Class => {
                let id = self.build_class(entity, desc)?;
                if desc.is_objc_class() && !desc.is_companion() {
                    let file = self.package_file_or_create(&desc.package);
                    self.arena.attach(file, id);
                }
                Ok(id)
            }
            EntityKind::Function => self.build_function(entity, desc),
            EntityKind::Property => self.build_property(entity, desc),
            EntityKind::TypeAlias => self.build_type_alias(entity, desc),
            EntityKind::Constructor => self.build_constructor(entity, desc),
            EntityKind::Field => self.build_field(entity, desc),
            EntityKind::EnumEntry => Err(ConfigurationError::Malformed {
                entity,
                reason: "enum entry outside an enum class".to_string(),
            }
            .into()),
            EntityKind::ValueParameter | EntityKind::TypeParameter => {
                Err(ConfigurationError::UnsupportedKind {
                    entity,
                    kind: desc.kind,
                }
                .into())
            }
        }
    }

    /// Nearest enum class among the containers of `desc`.
    fn enclosing_enum(&self, desc: &ForeignDescriptor) -> Option<ForeignRef> {
        let mut current = desc.container;
        while let Some(owner) = current {
            let owner_desc = self.reader.descriptor(owner)?;
            if owner_desc.is_enum_class() {
                return Some(owner);
            }
            current = owner_desc.container;
        }
        None
    }

    /// Members of an enum are only ever built by synthesizing the whole enum.
    fn materialize_enum_member(&mut self, entity: ForeignRef, owner: ForeignRef) -> Result<DeclId, StubError> {
        self.materialize(owner)?;
        self.registry
            .resolve(entity)
            .decl()
            .ok_or_else(|| {
                ConfigurationError::Malformed {
                    entity,
                    reason: format!("enum member is not produced by synthesizing {owner}"),
                }
                .into()
            })
    }

    /// Run `f`, undoing everything it did if it fails as the outermost
    /// request.
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, StubError>,
    ) -> Result<T, StubError> {
        let checkpoint = (self.depth == 0).then(|| Checkpoint {
            arena: self.arena.checkpoint(),
            registry: self.registry.checkpoint(),
            stats: self.stats,
        });
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        if let (Err(err), Some(checkpoint)) = (&result, checkpoint) {
            warn!(error = %err, "materialization failed, rolling back");
            self.rollback(checkpoint);
        }
        result
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        let mark = checkpoint.arena.container_mark();
        self.arena.rollback(checkpoint.arena);
        self.registry.rollback(checkpoint.registry);
        self.package_files.retain(|_, file| *file < mark);
        self.module.truncate(mark);
        // Built declarations are gone; registry hits were still answered.
        self.stats.factory_invocations = checkpoint.stats.factory_invocations;
        self.stats.enums_synthesized = checkpoint.stats.enums_synthesized;
        self.stats.rollbacks += 1;
    }

    /// The file of `package` that bridged classes live in, created on
    /// first use and appended to the module exactly once.
    pub(crate) fn package_file_or_create(&mut self, package: &str) -> ContainerId {
        let package_atom = self.arena.intern(package);
        if let Some(&file) = self.package_files.get(&package_atom) {
            return file;
        }
        let name = self.arena.intern(&self.options.objc_file_name);
        let file = self
            .arena
            .alloc_container(ContainerKind::File, package_atom, name, None);
        self.package_files.insert(package_atom, file);
        self.module.add_file(file);
        debug!(package, container = %file, "created package file");
        file
    }

    // =========================================================================
    // Source declarations
    // =========================================================================

    /// Add an ordinary source file to the module.
    pub fn add_source_file(&mut self, package: &str, name: &str) -> ContainerId {
        let package = self.arena.intern(package);
        let name = self.arena.intern(name);
        let file = self
            .arena
            .alloc_container(ContainerKind::File, package, name, None);
        self.module.add_file(file);
        file
    }

    /// Add a grouping container inside a file or another group.
    pub fn add_source_group(&mut self, parent: ContainerId, name: &str) -> Result<ContainerId, StubError> {
        let package = self
            .arena
            .container(parent)
            .map(|c| c.package)
            .ok_or(CallerMisuse::UnknownContainer(parent.0))?;
        let name = self.arena.intern(name);
        Ok(self
            .arena
            .alloc_container(ContainerKind::Group, package, name, Some(parent)))
    }

    /// Add a non-foreign declaration. Declarations under a container are
    /// attached to it; declarations under another declaration only record
    /// their parent.
    pub fn add_source_declaration(
        &mut self,
        parent: Parent,
        kind: DeclKind,
        name: &str,
        visibility: Visibility,
    ) -> Result<DeclId, StubError> {
        match parent {
            Parent::Container(c) if self.arena.container(c).is_none() => {
                return Err(CallerMisuse::UnknownContainer(c.0).into());
            }
            Parent::Declaration(d) if self.arena.get(d).is_none() => {
                return Err(CallerMisuse::UnknownDecl(d).into());
            }
            _ => {}
        }
        let payload = match kind {
            DeclKind::Function => DeclPayload::Function(FunctionDecl::default()),
            DeclKind::Property => DeclPayload::Property(PropertyDecl {
                accessors: Deferred::Ready(Accessors::default()),
                ..PropertyDecl::default()
            }),
            DeclKind::Class => DeclPayload::Class(ClassDecl {
                flavor: ClassFlavor::Class,
                members: Deferred::Ready(Vec::new()),
                supertypes: Deferred::Ready(Vec::new()),
            }),
            DeclKind::TypeAlias => DeclPayload::TypeAlias(TypeAliasDecl::default()),
            DeclKind::Constructor => DeclPayload::Constructor(ConstructorDecl::default()),
            DeclKind::Field => DeclPayload::Field(FieldDecl::default()),
            DeclKind::EnumEntry => DeclPayload::EnumEntry(EnumEntryDecl::default()),
            DeclKind::Variable => DeclPayload::Variable,
            DeclKind::AnonymousInitializer => DeclPayload::AnonymousInitializer,
            DeclKind::LocalDelegatedProperty => DeclPayload::LocalDelegatedProperty,
        };
        let name = self.arena.intern(name);
        let id = self.arena.alloc(
            Declaration::new(name, Origin::Source, parent, payload).with_visibility(visibility),
        );
        if let Parent::Container(c) = parent {
            self.arena.attach(c, id);
        }
        Ok(id)
    }

    // =========================================================================
    // Forcing deferred content
    // =========================================================================

    pub(crate) fn decl(&self, id: DeclId) -> Result<&Declaration, StubError> {
        Ok(self.arena.get(id).ok_or(CallerMisuse::UnknownDecl(id))?)
    }

    pub(crate) fn payload_mut(&mut self, id: DeclId) -> Result<&mut DeclPayload, StubError> {
        Ok(&mut self
            .arena
            .get_mut(id)
            .ok_or(CallerMisuse::UnknownDecl(id))?
            .payload)
    }

    fn foreign_descriptor(&self, id: DeclId) -> Result<(ForeignRef, &'r ForeignDescriptor), StubError> {
        let entity = self.decl(id)?.foreign.ok_or(CallerMisuse::NoForeignSource(id))?;
        let reader = self.reader;
        let desc = reader
            .descriptor(entity)
            .ok_or(CallerMisuse::UnknownEntity(entity))?;
        Ok((entity, desc))
    }

    fn wrong_kind(&self, id: DeclId, expected: &'static str) -> StubError {
        let found = self.arena.get(id).map_or(DeclKind::Function, Declaration::kind);
        CallerMisuse::WrongKind {
            decl: id,
            expected,
            found,
        }
        .into()
    }

    /// Declared type of a declaration, translated on first request.
    ///
    /// Functions report their return type, constructors and entries the
    /// type of their class, and classes themselves.
    #[tracing::instrument(level = "trace", skip_all, fields(decl_id = %id))]
    pub fn type_of(&mut self, id: DeclId) -> Result<IrType, StubError> {
        let decl = self.decl(id)?;
        let ready = match &decl.payload {
            DeclPayload::Property(p) => p.ty.get().cloned(),
            DeclPayload::Field(f) => f.ty.get().cloned(),
            DeclPayload::TypeAlias(t) => t.expanded.get().cloned(),
            DeclPayload::Class(_) => return Ok(IrType::Class(id)),
            DeclPayload::Function(_) => return Ok(self.signature_of(id)?.return_type),
            DeclPayload::Constructor(_) | DeclPayload::EnumEntry(_) => {
                return match decl.parent {
                    Parent::Declaration(class) => Ok(IrType::Class(class)),
                    _ => Err(self.wrong_kind(id, "class member")),
                };
            }
            DeclPayload::Variable
            | DeclPayload::AnonymousInitializer
            | DeclPayload::LocalDelegatedProperty => return Err(self.wrong_kind(id, "typed declaration")),
        };
        if let Some(ty) = ready {
            return Ok(ty);
        }
        self.atomically(|session| {
            let (entity, desc) = session.foreign_descriptor(id)?;
            let ty = session.translate_declared(entity, desc)?;
            match session.payload_mut(id)? {
                DeclPayload::Property(p) => p.ty = Deferred::Ready(ty.clone()),
                DeclPayload::Field(f) => f.ty = Deferred::Ready(ty.clone()),
                DeclPayload::TypeAlias(t) => t.expanded = Deferred::Ready(ty.clone()),
                _ => {}
            }
            Ok(ty)
        })
    }

    /// Parameters and return type of a function or constructor.
    #[tracing::instrument(level = "trace", skip_all, fields(decl_id = %id))]
    pub fn signature_of(&mut self, id: DeclId) -> Result<Signature, StubError> {
        let decl = self.decl(id)?;
        match &decl.payload {
            DeclPayload::Function(f) => {
                if let Some(sig) = f.signature.get() {
                    return Ok(sig.clone());
                }
            }
            DeclPayload::Constructor(c) => {
                let Parent::Declaration(class) = decl.parent else {
                    return Err(self.wrong_kind(id, "class member"));
                };
                if let Some(params) = c.params.get() {
                    return Ok(Signature {
                        params: params.clone(),
                        return_type: IrType::Class(class),
                    });
                }
            }
            _ => return Err(self.wrong_kind(id, "function or constructor")),
        }
        self.atomically(|session| {
            let (entity, desc) = session.foreign_descriptor(id)?;
            let params = session.translate_params(desc)?;
            let decl = session.decl(id)?;
            let constructed = match (&decl.payload, decl.parent) {
                (DeclPayload::Constructor(_), Parent::Declaration(class)) => Some(class),
                _ => None,
            };
            if let Some(class) = constructed {
                if let DeclPayload::Constructor(c) = session.payload_mut(id)? {
                    c.params = Deferred::Ready(params.clone());
                }
                return Ok(Signature {
                    params,
                    return_type: IrType::Class(class),
                });
            }
            let return_type = session.translate_declared(entity, desc)?;
            let sig = Signature {
                params,
                return_type,
            };
            if let DeclPayload::Function(f) = session.payload_mut(id)? {
                f.signature = Deferred::Ready(sig.clone());
            }
            Ok(sig)
        })
    }

    #[tracing::instrument(level = "trace", skip_all, fields(decl_id = %id))]
    pub fn supertypes_of(&mut self, id: DeclId) -> Result<Vec<IrType>, StubError> {
        match &self.decl(id)?.payload {
            DeclPayload::Class(c) => {
                if let Some(supertypes) = c.supertypes.get() {
                    return Ok(supertypes.clone());
                }
            }
            _ => return Err(self.wrong_kind(id, "class")),
        }
        self.atomically(|session| {
            let (_, desc) = session.foreign_descriptor(id)?;
            let translator = Rc::clone(&session.translator);
            let mut supertypes = Vec::new();
            for ty in desc.class.iter().flat_map(|c| c.supertypes.iter()) {
                supertypes.push(translator.translate(ty, &mut *session)?);
            }
            if let DeclPayload::Class(c) = session.payload_mut(id)? {
                c.supertypes = Deferred::Ready(supertypes.clone());
            }
            Ok(supertypes)
        })
    }

    /// Member declarations of a class, materializing every member that is
    /// not special-cased.
    #[tracing::instrument(level = "trace", skip_all, fields(decl_id = %id))]
    pub fn members_of(&mut self, id: DeclId) -> Result<Vec<DeclId>, StubError> {
        match &self.decl(id)?.payload {
            DeclPayload::Class(c) => {
                if let Some(members) = c.members.get() {
                    return Ok(members.clone());
                }
            }
            _ => return Err(self.wrong_kind(id, "class")),
        }
        self.atomically(|session| {
            let (_, desc) = session.foreign_descriptor(id)?;
            let reader = session.reader;
            let mut members = Vec::with_capacity(desc.members().len());
            for &member in desc.members() {
                let Some(member_desc) = reader.descriptor(member) else {
                    continue;
                };
                if session.is_special_cased(member, member_desc) {
                    trace!(entity = %member, "skipping special-cased member");
                    continue;
                }
                members.push(session.materialize(member)?);
            }
            if let DeclPayload::Class(c) = session.payload_mut(id)? {
                c.members = Deferred::Ready(members.clone());
            }
            Ok(members)
        })
    }

    /// Getter and setter of a property.
    #[tracing::instrument(level = "trace", skip_all, fields(decl_id = %id))]
    pub fn accessors_of(&mut self, id: DeclId) -> Result<Accessors, StubError> {
        match &self.decl(id)?.payload {
            DeclPayload::Property(p) => {
                if let Some(accessors) = p.accessors.get() {
                    return Ok(*accessors);
                }
            }
            _ => return Err(self.wrong_kind(id, "property")),
        }
        self.atomically(|session| {
            let (_, desc) = session.foreign_descriptor(id)?;
            let info = desc.property.clone().unwrap_or_default();
            let accessors = Accessors {
                getter: info.getter.map(|g| session.materialize(g)).transpose()?,
                setter: info.setter.map(|s| session.materialize(s)).transpose()?,
            };
            if let DeclPayload::Property(p) = session.payload_mut(id)? {
                p.accessors = Deferred::Ready(accessors);
            }
            Ok(accessors)
        })
    }
}

impl ClassSymbolResolver for StubSession<'_> {
    fn resolve_class(&mut self, entity: ForeignRef) -> Result<DeclId, StubError> {
        self.materialize(entity)
    }
}
