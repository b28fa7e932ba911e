//! Top-level declaration scope.

use rustc_hash::FxHashSet;

/// Names declared at the top level of one package.
///
/// Classifiers and reserved names are seeded up front; properties are
/// declared one at a time and a declaration fails if the name is taken.
#[derive(Clone, Debug, Default)]
pub struct TopLevelScope {
    declared: FxHashSet<String>,
}

impl TopLevelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a name that is already present. Seeding twice is harmless.
    pub fn seed(&mut self, name: &str) {
        if !self.declared.contains(name) {
            self.declared.insert(name.to_string());
        }
    }

    /// Declare a property name. Returns false if the name is taken.
    pub fn declare_property(&mut self, name: &str) -> bool {
        if self.declared.contains(name) {
            return false;
        }
        self.declared.insert(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
