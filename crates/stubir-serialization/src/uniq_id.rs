use serde::Serialize;
use std::fmt;

/// Identity a declaration is serialized under. Equal across compilations
/// for the same declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UniqId(pub u64);

impl fmt::Display for UniqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// How an identity was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentitySource {
    /// Taken verbatim from the interop library's metadata.
    Precomputed,
    /// Hashed from the declaration's position in the module.
    Structural,
}
