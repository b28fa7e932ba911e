//! Declaration arena.
//!
//! Owns every declaration and container of one compilation unit together
//! with the name interner. Nodes are addressed by index and never move.
//! The arena supports checkpoints so a failed composite construction can
//! be undone without leaving partial nodes behind.

use crate::container::{Container, ContainerId, ContainerKind};
use crate::decl::{DeclId, DeclPayload, Declaration, Deferred, Parent};
use smallvec::SmallVec;
use stubir_common::{Atom, Interner};
use tracing::trace;

/// Arena state to roll back to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaCheckpoint {
    decls: usize,
    containers: usize,
}

impl ArenaCheckpoint {
    /// First container id allocated after the checkpoint.
    pub fn container_mark(self) -> ContainerId {
        ContainerId(self.containers as u32)
    }
}

#[derive(Debug)]
pub struct DeclArena {
    decls: Vec<Declaration>,
    containers: Vec<Container>,
    interner: Interner,
}

impl Default for DeclArena {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclArena {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        interner.intern_common();
        Self {
            decls: Vec::new(),
            containers: Vec::new(),
            interner,
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub fn intern(&mut self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    pub fn resolve(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Declared name of `id`, empty if the id is stale.
    pub fn name(&self, id: DeclId) -> &str {
        self.get(id).map_or("", |d| self.interner.resolve(d.name))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn alloc(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        trace!(
            decl_id = %id,
            kind = decl.kind().as_str(),
            name = self.interner.resolve(decl.name),
            origin = ?decl.origin,
            "DeclArena::alloc"
        );
        self.decls.push(decl);
        id
    }

    #[inline]
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    /// Owned children of a declaration: forced class members, then a
    /// property's backing field and accessors.
    pub fn children(&self, id: DeclId) -> SmallVec<[DeclId; 4]> {
        let mut out = SmallVec::new();
        let Some(decl) = self.get(id) else {
            return out;
        };
        match &decl.payload {
            DeclPayload::Class(class) => {
                if let Deferred::Ready(members) = &class.members {
                    out.extend(members.iter().copied());
                }
            }
            DeclPayload::Property(prop) => {
                out.extend(prop.backing_field);
                if let Deferred::Ready(accessors) = &prop.accessors {
                    out.extend(accessors.getter);
                    out.extend(accessors.setter);
                }
            }
            _ => {}
        }
        out
    }

    // =========================================================================
    // Containers
    // =========================================================================

    /// Allocate a container. Groups are linked into their parent.
    pub fn alloc_container(
        &mut self,
        kind: ContainerKind,
        package: Atom,
        name: Atom,
        parent: Option<ContainerId>,
    ) -> ContainerId {
        let id = ContainerId(self.containers.len() as u32);
        self.containers.push(Container::new(kind, package, name, parent));
        if let Some(parent) = parent
            && let Some(p) = self.containers.get_mut(parent.index())
        {
            p.groups.push(id);
        }
        trace!(container = %id, ?kind, name = self.interner.resolve(name), "DeclArena::alloc_container");
        id
    }

    #[inline]
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.index())
    }

    #[inline]
    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.get_mut(id.index())
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Append `decl` to `container` and make the container its parent.
    /// Returns false if either id is stale.
    pub fn attach(&mut self, container: ContainerId, decl: DeclId) -> bool {
        let Some(c) = self.containers.get_mut(container.index()) else {
            return false;
        };
        let Some(d) = self.decls.get_mut(decl.index()) else {
            return false;
        };
        c.declarations.push(decl);
        d.parent = Parent::Container(container);
        true
    }

    /// File container that `container` belongs to.
    pub fn file_of(&self, mut container: ContainerId) -> ContainerId {
        while let Some(parent) = self.container(container).and_then(|c| c.parent) {
            container = parent;
        }
        container
    }

    // =========================================================================
    // Checkpoints
    // =========================================================================

    pub fn checkpoint(&self) -> ArenaCheckpoint {
        ArenaCheckpoint {
            decls: self.decls.len(),
            containers: self.containers.len(),
        }
    }

    /// Drop every declaration and container allocated after `checkpoint`
    /// and unlink them from surviving containers.
    pub fn rollback(&mut self, checkpoint: ArenaCheckpoint) {
        trace!(
            dropped_decls = self.decls.len().saturating_sub(checkpoint.decls),
            dropped_containers = self.containers.len().saturating_sub(checkpoint.containers),
            "DeclArena::rollback"
        );
        self.decls.truncate(checkpoint.decls);
        self.containers.truncate(checkpoint.containers);
        let decl_mark = checkpoint.decls as u32;
        let container_mark = checkpoint.containers as u32;
        for c in &mut self.containers {
            c.declarations.retain(|d| d.0 < decl_mark);
            c.groups.retain(|g| g.0 < container_mark);
        }
    }
}
