//! Declaration containers (files and their nested groups).

use crate::decl::DeclId;
use serde::Serialize;
use std::fmt;
use stubir_common::Atom;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId(pub u32);

impl ContainerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    /// A file of the module, scoped to one package.
    File,
    /// Grouping inside a file. Shares the file's top-level scope.
    Group,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    pub kind: ContainerKind,
    pub package: Atom,
    pub name: Atom,
    /// Direct declarations in insertion order.
    pub declarations: Vec<DeclId>,
    /// Nested groups in declared order.
    pub groups: Vec<ContainerId>,
    pub parent: Option<ContainerId>,
}

impl Container {
    pub fn new(kind: ContainerKind, package: Atom, name: Atom, parent: Option<ContainerId>) -> Self {
        Self {
            kind,
            package,
            name,
            declarations: Vec::new(),
            groups: Vec::new(),
            parent,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == ContainerKind::File
    }
}
