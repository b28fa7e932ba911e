use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::args::CliArgs;
use stubir_names::NameResolverOptions;
use stubir_provider::ProviderOptions;

pub const CONFIG_FILE_NAME: &str = "stubir.json";

pub const DEFAULT_MODULE_NAME: &str = "main";

/// Contents of a `stubir.json` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StubirConfig {
    pub module_name: Option<String>,
    pub provider: ProviderOptions,
    pub names: NameResolverOptions,
    /// Dotted names of special-cased entities.
    pub special: Vec<String>,
}

impl StubirConfig {
    pub fn module_name(&self) -> &str {
        self.module_name.as_deref().unwrap_or(DEFAULT_MODULE_NAME)
    }
}

pub fn load_config(path: &Path) -> Result<StubirConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Config file to use: the explicit one, or `stubir.json` in `cwd`.
pub fn find_config(args: &CliArgs, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(cwd.join(path));
    }
    let default = cwd.join(CONFIG_FILE_NAME);
    default.is_file().then_some(default)
}

/// Load the config file (if any) and apply command-line overrides.
pub fn resolve_config(args: &CliArgs, cwd: &Path) -> Result<StubirConfig> {
    let mut config = match find_config(args, cwd) {
        Some(path) => load_config(&path)?,
        None => StubirConfig::default(),
    };
    if let Some(name) = &args.module_name {
        config.module_name = Some(name.clone());
    }
    if let Some(file_name) = &args.objc_file_name {
        config.provider.objc_file_name = file_name.clone();
    }
    config.special.extend(args.special.iter().cloned());
    config.names.reserved.extend(args.reserved.iter().cloned());
    Ok(config)
}
