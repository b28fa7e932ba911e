//! String interner for declaration names.
//!
//! Names are interned into a per-arena pool and passed around as u32
//! indices (`Atom`). Comparisons are integer comparisons, and the same
//! foreign name requested from many call sites is stored once.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names that every interop session ends up interning.
const COMMON_STRINGS: &[&str] = &[
    "value",
    "values",
    "valueOf",
    "name",
    "Var",
    "Companion",
    "rawPtr",
    "<init>",
    "<get-value>",
    "<set-value>",
    "<set-?>",
];

/// Single-threaded string interner.
#[derive(Clone, Debug)]
pub struct Interner {
    /// Map from string to atom index
    map: FxHashMap<Arc<str>, Atom>,
    /// Vector of all interned strings (index 0 is empty string)
    strings: Vec<Arc<str>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // Index 0 is reserved for empty/none
        let empty: Arc<str> = Arc::from("");
        interner.strings.push(empty.clone());
        interner.map.insert(empty, Atom::NONE);
        interner
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    #[inline]
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        self.strings.push(owned.clone());
        self.map.insert(owned, atom);
        atom
    }

    /// Look up an already interned string without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    /// Resolve an Atom back to its string value.
    /// Returns empty string if atom is out of bounds.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("")
    }

    /// Get the number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the interner is empty (only has the empty string).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    /// Pre-intern the member names used by enum synthesis.
    pub fn intern_common(&mut self) {
        for s in COMMON_STRINGS {
            self.intern(s);
        }
    }
}
