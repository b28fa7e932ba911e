//! Name ambiguity resolver.
//!
//! Runs once over a finished module. Every top-level property declares its
//! name in the top-level scope of its package; on a collision the marker is
//! appended and the declaration retried until it succeeds. Each retry makes
//! the candidate longer, so the loop always ends.
//!
//! Only properties owned directly by a file take part. Properties inside
//! groups and class members keep their declared names. Within a package the
//! files are visited in module order, followed by the stubs placed straight
//! in the foreign package, in allocation order.

use crate::scope::TopLevelScope;
use crate::unique::UniqueNames;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use stubir_common::Atom;
use stubir_ir::{BoundModule, ContainerId, DeclArena, DeclId, DeclKind, Parent};
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NameResolverOptions {
    /// Appended to a colliding name on each retry.
    pub marker: char,
    /// Names treated as already declared in every package.
    pub reserved: Vec<String>,
}

impl Default for NameResolverOptions {
    fn default() -> Self {
        Self {
            marker: '_',
            reserved: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NameAmbiguityResolver {
    options: NameResolverOptions,
}

impl NameAmbiguityResolver {
    pub fn new(options: NameResolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NameResolverOptions {
        &self.options
    }

    /// Resolve one file in a fresh scope.
    pub fn resolve_container(&self, arena: &DeclArena, container: ContainerId) -> UniqueNames {
        let mut scope = self.seeded_scope(arena, &[container], &[]);
        let mut names = UniqueNames::default();
        self.visit(arena, container, &mut scope, &mut names);
        names
    }

    /// Resolve every package of a module. Files of one package share a scope
    /// with the stubs of that package that have no file.
    #[tracing::instrument(level = "debug", skip_all, fields(module = module.name()))]
    pub fn resolve_module(&self, module: &BoundModule) -> UniqueNames {
        let arena = module.arena();
        let mut packages: Vec<PackageScope> = Vec::new();
        let mut slot: FxHashMap<Atom, usize> = FxHashMap::default();
        let mut package_index = |package: Atom, packages: &mut Vec<PackageScope>| {
            *slot.entry(package).or_insert_with(|| {
                packages.push(PackageScope {
                    package,
                    files: Vec::new(),
                    external: Vec::new(),
                });
                packages.len() - 1
            })
        };
        for &file in module.files() {
            let Some(container) = arena.container(file) else {
                continue;
            };
            let index = package_index(container.package, &mut packages);
            packages[index].files.push(file);
        }
        for (id, decl) in arena.iter() {
            if let Parent::ExternalPackage(package) = decl.parent {
                let index = package_index(package, &mut packages);
                packages[index].external.push(id);
            }
        }

        let mut names = UniqueNames::default();
        for package in &packages {
            trace!(
                package = arena.resolve(package.package),
                files = package.files.len(),
                external = package.external.len(),
                "resolving package"
            );
            let mut scope = self.seeded_scope(arena, &package.files, &package.external);
            for &file in &package.files {
                self.visit(arena, file, &mut scope, &mut names);
            }
            self.declare_all(arena, &package.external, &mut scope, &mut names);
        }
        debug!(renamed = names.len(), "name resolution done");
        names
    }

    /// Scope holding the reserved names, every classifier declared in
    /// `roots` or their groups, and the classifiers among `external`.
    fn seeded_scope(&self, arena: &DeclArena, roots: &[ContainerId], external: &[DeclId]) -> TopLevelScope {
        let mut scope = TopLevelScope::new();
        for name in &self.options.reserved {
            scope.seed(name);
        }
        let is_classifier = |decl: DeclId| arena.get(decl).is_some_and(|d| d.kind().is_classifier());
        let mut pending: Vec<ContainerId> = roots.to_vec();
        while let Some(id) = pending.pop() {
            let Some(container) = arena.container(id) else {
                continue;
            };
            for &decl in &container.declarations {
                if is_classifier(decl) {
                    scope.seed(arena.name(decl));
                }
            }
            pending.extend(container.groups.iter().copied());
        }
        for &decl in external {
            if is_classifier(decl) {
                scope.seed(arena.name(decl));
            }
        }
        scope
    }

    fn visit(&self, arena: &DeclArena, id: ContainerId, scope: &mut TopLevelScope, names: &mut UniqueNames) {
        if let Some(container) = arena.container(id) {
            self.declare_all(arena, &container.declarations, scope, names);
        }
    }

    fn declare_all(&self, arena: &DeclArena, decls: &[DeclId], scope: &mut TopLevelScope, names: &mut UniqueNames) {
        for &decl in decls {
            if arena.get(decl).is_none_or(|d| d.kind() != DeclKind::Property) {
                continue;
            }
            let declared = arena.name(decl);
            let mut candidate = declared.to_string();
            while !scope.declare_property(&candidate) {
                candidate.push(self.options.marker);
            }
            if candidate != declared {
                debug!(decl_id = %decl, from = declared, to = %candidate, "renamed property");
                names.record(decl, candidate);
            }
        }
    }
}

struct PackageScope {
    package: Atom,
    files: Vec<ContainerId>,
    external: Vec<DeclId>,
}
