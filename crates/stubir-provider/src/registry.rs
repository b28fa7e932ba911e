//! Identity registry: foreign entity to declaration, at most once.
//!
//! A placeholder is recorded before construction recurses, so re-entrant
//! lookups for the same entity observe `InProgress` instead of starting a
//! second construction. Bindings only move forward
//! (`Unbound` -> `InProgress` -> `Bound`); the only way back is a rollback
//! of a failed outermost request.

use rustc_hash::FxHashMap;
use stubir_ir::DeclId;
use stubir_metadata::ForeignRef;
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Unbound,
    InProgress(DeclId),
    Bound(DeclId),
}

impl Resolution {
    pub fn decl(self) -> Option<DeclId> {
        match self {
            Resolution::Unbound => None,
            Resolution::InProgress(id) | Resolution::Bound(id) => Some(id),
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Binding {
    decl: DeclId,
    complete: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegistryCheckpoint(usize);

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    bindings: FxHashMap<ForeignRef, Binding>,
    /// Insertion order, for rollback.
    journal: Vec<ForeignRef>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, entity: ForeignRef) -> Resolution {
        match self.bindings.get(&entity) {
            None => Resolution::Unbound,
            Some(b) if b.complete => Resolution::Bound(b.decl),
            Some(b) => Resolution::InProgress(b.decl),
        }
    }

    /// Record a placeholder. Returns the existing declaration if the entity
    /// is already known.
    pub fn reserve(&mut self, entity: ForeignRef, decl: DeclId) -> Result<(), DeclId> {
        if let Some(existing) = self.bindings.get(&entity) {
            return Err(existing.decl);
        }
        trace!(entity = %entity, decl_id = %decl, "IdentityRegistry::reserve");
        self.bindings.insert(
            entity,
            Binding {
                decl,
                complete: false,
            },
        );
        self.journal.push(entity);
        Ok(())
    }

    /// Finish an in-progress binding. No-op for unknown or bound entities.
    pub fn complete(&mut self, entity: ForeignRef) {
        if let Some(binding) = self.bindings.get_mut(&entity) {
            binding.complete = true;
        }
    }

    /// Reserve and complete in one step, for declarations with nothing to
    /// recurse into.
    pub fn bind(&mut self, entity: ForeignRef, decl: DeclId) -> Result<(), DeclId> {
        self.reserve(entity, decl)?;
        self.complete(entity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn checkpoint(&self) -> RegistryCheckpoint {
        RegistryCheckpoint(self.journal.len())
    }

    pub fn rollback(&mut self, checkpoint: RegistryCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            if let Some(entity) = self.journal.pop() {
                self.bindings.remove(&entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_is_monotonic() {
        let mut registry = IdentityRegistry::new();
        let entity = ForeignRef(3);
        assert_eq!(registry.resolve(entity), Resolution::Unbound);

        registry.reserve(entity, DeclId(0)).expect("first reservation");
        assert_eq!(registry.resolve(entity), Resolution::InProgress(DeclId(0)));
        assert_eq!(registry.reserve(entity, DeclId(1)), Err(DeclId(0)));

        registry.complete(entity);
        assert_eq!(registry.resolve(entity), Resolution::Bound(DeclId(0)));
        assert_eq!(registry.bind(entity, DeclId(2)), Err(DeclId(0)));
        assert_eq!(registry.resolve(entity).decl(), Some(DeclId(0)));
    }

    #[test]
    fn test_rollback_forgets_later_bindings() {
        let mut registry = IdentityRegistry::new();
        registry.bind(ForeignRef(0), DeclId(0)).expect("bind");
        let checkpoint = registry.checkpoint();
        registry.reserve(ForeignRef(1), DeclId(1)).expect("reserve");
        registry.bind(ForeignRef(2), DeclId(2)).expect("bind");

        registry.rollback(checkpoint);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve(ForeignRef(0)), Resolution::Bound(DeclId(0)));
        assert_eq!(registry.resolve(ForeignRef(1)), Resolution::Unbound);
        assert_eq!(registry.resolve(ForeignRef(2)), Resolution::Unbound);
    }
}
