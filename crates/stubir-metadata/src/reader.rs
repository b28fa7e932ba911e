//! Read-only access to foreign metadata.

use crate::entity::{EntityKind, ForeignDescriptor, ForeignRef};
use rustc_hash::FxHashMap;

/// The contract the provider consumes from the metadata reader.
///
/// Readers hand out `ForeignRef`s and resolve them to descriptors. Every
/// method is read-only; descriptors never change during a compilation.
pub trait MetadataReader {
    fn descriptor(&self, entity: ForeignRef) -> Option<&ForeignDescriptor>;

    /// First member of `class` with the given name and kind.
    fn find_member(&self, class: ForeignRef, name: &str, kind: EntityKind) -> Option<ForeignRef> {
        let desc = self.descriptor(class)?;
        desc.members().iter().copied().find(|&member| {
            self.descriptor(member)
                .is_some_and(|m| m.kind == kind && m.name == name)
        })
    }

    /// Dotted name including the package and every enclosing classifier.
    fn fq_name(&self, entity: ForeignRef) -> String {
        let mut segments = Vec::new();
        let mut package = String::new();
        let mut current = Some(entity);
        while let Some(id) = current {
            let Some(desc) = self.descriptor(id) else {
                break;
            };
            segments.push(desc.name.as_str());
            package = desc.package.clone();
            current = desc.container;
        }
        segments.reverse();
        if package.is_empty() {
            segments.join(".")
        } else {
            format!("{}.{}", package, segments.join("."))
        }
    }
}

/// In-memory metadata reader.
///
/// Built by `MetadataBuilder`; `ForeignRef(n)` is the n-th descriptor.
#[derive(Clone, Debug, Default)]
pub struct MetadataIndex {
    pub(crate) library: String,
    pub(crate) descriptors: Vec<ForeignDescriptor>,
    pub(crate) by_fq_name: FxHashMap<String, ForeignRef>,
}

impl MetadataIndex {
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Entity by dotted name. Overloads resolve to the first declared.
    pub fn lookup(&self, fq_name: &str) -> Option<ForeignRef> {
        self.by_fq_name.get(fq_name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ForeignRef, &ForeignDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (ForeignRef(i as u32), d))
    }

    /// Top-level entities (no container, not accessors) in declaration order.
    pub fn top_level(&self) -> impl Iterator<Item = ForeignRef> + '_ {
        self.iter()
            .filter(|(_, d)| d.container.is_none() && d.accessor_of.is_none())
            .map(|(r, _)| r)
    }
}

impl MetadataReader for MetadataIndex {
    fn descriptor(&self, entity: ForeignRef) -> Option<&ForeignDescriptor> {
        self.descriptors.get(entity.0 as usize)
    }
}
