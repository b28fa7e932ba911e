//! Session configuration.

use serde::Deserialize;

/// File name of the per-package container holding bridged object classes.
pub const DEFAULT_OBJC_FILE_NAME: &str = "ForeignClasses";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Name of the synthetic file created per foreign package.
    pub objc_file_name: String,
    /// Attach top-level enums to their package file, like bridged classes.
    pub attach_top_level_enums: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            objc_file_name: DEFAULT_OBJC_FILE_NAME.to_string(),
            attach_top_level_enums: true,
        }
    }
}
