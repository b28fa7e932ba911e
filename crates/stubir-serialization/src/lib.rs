//! Identity export for serialized stubir modules.

pub mod table;
pub mod uniq_id;

pub use table::DeclarationTable;
pub use uniq_id::{IdentitySource, UniqId};

#[cfg(test)]
#[path = "../tests/table_tests.rs"]
mod table_tests;
