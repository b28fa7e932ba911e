//! Module construction.
//!
//! A module is built in two phases. While the provider runs, a
//! `ModuleBuilder` collects file containers (each exactly once). When the
//! session finishes, `bind` consumes the builder together with the arena and
//! yields an immutable `BoundModule` that later passes read.

use crate::arena::DeclArena;
use crate::container::{Container, ContainerId};
use crate::decl::{DeclId, Declaration, Parent};
use rustc_hash::FxHashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    name: String,
    files: Vec<ContainerId>,
    seen: FxHashSet<ContainerId>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a file. Returns false if it was already part of the module.
    pub fn add_file(&mut self, file: ContainerId) -> bool {
        if !self.seen.insert(file) {
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn files(&self) -> &[ContainerId] {
        &self.files
    }

    /// Forget files allocated at or after `mark`.
    pub fn truncate(&mut self, mark: ContainerId) {
        self.files.retain(|f| *f < mark);
        self.seen.retain(|f| *f < mark);
    }

    pub fn bind(self, arena: DeclArena) -> BoundModule {
        debug!(module = %self.name, files = self.files.len(), decls = arena.len(), "ModuleBuilder::bind");
        BoundModule {
            name: self.name,
            arena,
            files: self.files,
        }
    }
}

/// The finished declaration tree of one compilation unit.
#[derive(Debug)]
pub struct BoundModule {
    name: String,
    arena: DeclArena,
    files: Vec<ContainerId>,
}

impl BoundModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    pub fn files(&self) -> &[ContainerId] {
        &self.files
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.arena.container(id)
    }

    pub fn decl(&self, id: DeclId) -> Option<&Declaration> {
        self.arena.get(id)
    }

    /// Depth-first walk over every file: a container's direct declarations
    /// (each followed by its children) before its groups. Stubs placed in an
    /// external package follow, in allocation order.
    pub fn walk(&self, mut visit: impl FnMut(DeclId, usize)) {
        for &file in &self.files {
            self.walk_container(file, 0, &mut visit);
        }
        let external: Vec<DeclId> = self
            .arena
            .iter()
            .filter(|(_, d)| matches!(d.parent, Parent::ExternalPackage(_)))
            .map(|(id, _)| id)
            .collect();
        for id in external {
            self.walk_decl(id, 0, &mut visit);
        }
    }

    fn walk_container(&self, id: ContainerId, depth: usize, visit: &mut impl FnMut(DeclId, usize)) {
        let Some(container) = self.arena.container(id) else {
            return;
        };
        for &decl in &container.declarations {
            self.walk_decl(decl, depth, visit);
        }
        for &group in &container.groups {
            self.walk_container(group, depth, visit);
        }
    }

    fn walk_decl(&self, id: DeclId, depth: usize, visit: &mut impl FnMut(DeclId, usize)) {
        visit(id, depth);
        for child in self.arena.children(id) {
            self.walk_decl(child, depth + 1, visit);
        }
    }

    /// Package and enclosing declaration names of `id`, outermost first,
    /// ending with its own name.
    pub fn qualified_path(&self, id: DeclId) -> (String, Vec<&str>) {
        qualified_path(&self.arena, id)
    }

    pub fn fq_name(&self, id: DeclId) -> String {
        let (package, segments) = self.qualified_path(id);
        if package.is_empty() {
            segments.join(".")
        } else {
            format!("{package}.{}", segments.join("."))
        }
    }
}

/// Walk parents up to the package. Stops on stale ids.
pub fn qualified_path(arena: &DeclArena, id: DeclId) -> (String, Vec<&str>) {
    let mut segments = Vec::new();
    let mut package = String::new();
    let mut current = Some(id);
    while let Some(decl_id) = current {
        let Some(decl) = arena.get(decl_id) else {
            break;
        };
        segments.push(arena.resolve(decl.name));
        current = match decl.parent {
            Parent::Declaration(owner) => Some(owner),
            Parent::Container(c) => {
                package = arena
                    .container(c)
                    .map(|c| arena.resolve(c.package).to_string())
                    .unwrap_or_default();
                None
            }
            Parent::ExternalPackage(pkg) => {
                package = arena.resolve(pkg).to_string();
                None
            }
        };
    }
    segments.reverse();
    (package, segments)
}
