//! Result table of name resolution.

use rustc_hash::FxHashMap;
use stubir_ir::{DeclArena, DeclId};

/// Properties whose name had to change. Properties that kept their
/// declared name are not recorded.
#[derive(Clone, Debug, Default)]
pub struct UniqueNames {
    altered: FxHashMap<DeclId, String>,
}

impl UniqueNames {
    pub(crate) fn record(&mut self, decl: DeclId, name: String) {
        self.altered.entry(decl).or_insert(name);
    }

    /// Resolved name of `decl`: its override, or its declared name.
    pub fn unique_name_for<'a>(&'a self, arena: &'a DeclArena, decl: DeclId) -> &'a str {
        match self.altered.get(&decl) {
            Some(name) => name,
            None => arena.name(decl),
        }
    }

    pub fn altered(&self, decl: DeclId) -> Option<&str> {
        self.altered.get(&decl).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.altered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.altered.is_empty()
    }

    /// Overrides ordered by declaration id.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &str)> {
        let mut entries: Vec<(DeclId, &str)> = self
            .altered
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries.into_iter()
    }
}
