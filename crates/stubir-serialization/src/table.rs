//! Declaration identity table.
//!
//! Declarations materialized from an interop library already carry an
//! identity computed when the library was generated. Reusing it keeps
//! references stable across compilations that each materialize their own
//! copy of the stub. Everything else is identified structurally: the
//! qualified path and kind, the parameter types of callables, and the
//! position among declarations that agree on all of those in walk order.

use crate::uniq_id::{IdentitySource, UniqId};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use stubir_ir::{BoundModule, DeclId, DeclPayload, Declaration, IrType};
use stubir_metadata::{ForeignRef, ForeignType, MetadataReader};
use stubir_provider::{CallerMisuse, IdentityViolation, StubError};
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Entry {
    id: UniqId,
    source: IdentitySource,
}

pub struct DeclarationTable<'m> {
    module: &'m BoundModule,
    reader: &'m dyn MetadataReader,
    memo: FxHashMap<DeclId, Entry>,
    /// Structural identities of every walked declaration, built on first use.
    structural: Option<FxHashMap<DeclId, UniqId>>,
}

impl<'m> DeclarationTable<'m> {
    pub fn new(module: &'m BoundModule, reader: &'m dyn MetadataReader) -> Self {
        Self {
            module,
            reader,
            memo: FxHashMap::default(),
            structural: None,
        }
    }

    pub fn module(&self) -> &'m BoundModule {
        self.module
    }

    /// Identity of `decl`.
    pub fn identity_for(&mut self, decl: DeclId) -> Result<UniqId, StubError> {
        Ok(self.entry(decl)?.id)
    }

    /// Where the identity of `decl` comes from.
    pub fn source_of(&mut self, decl: DeclId) -> Result<IdentitySource, StubError> {
        Ok(self.entry(decl)?.source)
    }

    /// Identities of every declaration in walk order.
    #[tracing::instrument(level = "debug", skip_all, fields(module = self.module.name()))]
    pub fn export_all(&mut self) -> Result<Vec<(DeclId, UniqId)>, StubError> {
        let mut order = Vec::new();
        self.module.walk(|id, _| order.push(id));
        let mut table = Vec::with_capacity(order.len());
        for id in order {
            table.push((id, self.identity_for(id)?));
        }
        debug!(declarations = table.len(), "exported identities");
        Ok(table)
    }

    fn entry(&mut self, id: DeclId) -> Result<Entry, StubError> {
        if let Some(entry) = self.memo.get(&id) {
            return Ok(*entry);
        }
        let module = self.module;
        let decl = module.decl(id).ok_or(CallerMisuse::UnknownDecl(id))?;

        let entry = match self.precomputed_source(decl) {
            Some(entity) => {
                let uniq = self
                    .reader
                    .descriptor(entity)
                    .and_then(|d| d.uniq_id)
                    .ok_or_else(|| IdentityViolation::MissingUniqId {
                        name: module.fq_name(id),
                        entity,
                    })?;
                Entry {
                    id: UniqId(uniq),
                    source: IdentitySource::Precomputed,
                }
            }
            None => Entry {
                id: self.structural(id, decl),
                source: IdentitySource::Structural,
            },
        };
        trace!(decl_id = %id, uniq_id = %entry.id, source = ?entry.source, "identity");
        self.memo.insert(id, entry);
        Ok(entry)
    }

    /// Entity whose precomputed identity `decl` reuses, if any.
    fn precomputed_source(&self, decl: &Declaration) -> Option<ForeignRef> {
        let entity = decl.foreign?;
        let desc = self.reader.descriptor(entity)?;
        if !desc.origin.is_from_interop_library() || decl.is_local() {
            return None;
        }
        // Accessors are identified by the property they belong to.
        if let Some(property) = decl.as_function().and_then(|f| f.corresponding_property)
            && let Some(owner) = self.module.decl(property).and_then(|p| p.foreign)
        {
            return Some(owner);
        }
        Some(desc.accessor_of.unwrap_or(entity))
    }

    fn structural(&mut self, id: DeclId, decl: &Declaration) -> UniqId {
        let (module, reader) = (self.module, self.reader);
        let ids = self
            .structural
            .get_or_insert_with(|| structural_ids(module, reader));
        match ids.get(&id) {
            Some(uniq) => *uniq,
            // Not reachable from the walk.
            None => with_ordinal(structural_key(module, reader, id, decl), 0),
        }
    }
}

/// Assign structural identities in walk order. Declarations sharing a key
/// are told apart by their ordinal among themselves.
fn structural_ids(module: &BoundModule, reader: &dyn MetadataReader) -> FxHashMap<DeclId, UniqId> {
    let mut order = Vec::new();
    module.walk(|id, _| order.push(id));
    let mut seen: FxHashMap<u64, u32> = FxHashMap::default();
    let mut ids = FxHashMap::default();
    for id in order {
        let Some(decl) = module.decl(id) else {
            continue;
        };
        let key = structural_key(module, reader, id, decl);
        let ordinal = seen.entry(key).or_insert(0);
        ids.insert(id, with_ordinal(key, *ordinal));
        *ordinal += 1;
    }
    ids
}

fn structural_key(module: &BoundModule, reader: &dyn MetadataReader, id: DeclId, decl: &Declaration) -> u64 {
    let (package, segments) = module.qualified_path(id);
    let mut hasher = FxHasher::default();
    package.hash(&mut hasher);
    segments.hash(&mut hasher);
    decl.kind().as_str().hash(&mut hasher);
    parameter_key(module, reader, decl).hash(&mut hasher);
    hasher.finish()
}

fn with_ordinal(key: u64, ordinal: u32) -> UniqId {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    ordinal.hash(&mut hasher);
    UniqId(hasher.finish())
}

/// Parameter types of a callable, rendered by name so they do not depend on
/// arena indices. Descriptor parameters win over translated ones, which may
/// not have been forced.
fn parameter_key(module: &BoundModule, reader: &dyn MetadataReader, decl: &Declaration) -> Option<Vec<String>> {
    let translated = match &decl.payload {
        DeclPayload::Function(function) => function.signature.get().map(|s| s.params.as_slice()),
        DeclPayload::Constructor(constructor) => constructor.params.get().map(Vec::as_slice),
        _ => return None,
    };
    if let Some(desc) = decl.foreign.and_then(|entity| reader.descriptor(entity)) {
        return Some(desc.params.iter().map(|p| foreign_type_key(reader, &p.ty)).collect());
    }
    translated.map(|params| params.iter().map(|p| ir_type_key(module, &p.ty)).collect())
}

fn foreign_type_key(reader: &dyn MetadataReader, ty: &ForeignType) -> String {
    match ty {
        ForeignType::Primitive(kind) => kind.to_string(),
        ForeignType::Entity(entity) => match reader.descriptor(*entity) {
            Some(desc) => format!("{}.{}", desc.package, desc.name),
            None => entity.to_string(),
        },
        ForeignType::Pointer(inner) => format!("*{}", foreign_type_key(reader, inner)),
        ForeignType::Unsupported(name) => name.clone(),
    }
}

fn ir_type_key(module: &BoundModule, ty: &IrType) -> String {
    match ty {
        IrType::Class(id) => module.fq_name(*id),
        IrType::Pointer(inner) => format!("*{}", ir_type_key(module, inner)),
        IrType::Array(inner) => format!("Array<{}>", ir_type_key(module, inner)),
        other => other.to_string(),
    }
}
