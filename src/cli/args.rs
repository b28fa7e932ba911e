use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the stubir binary.
#[derive(Parser, Debug)]
#[command(
    name = "stubir",
    version,
    about = "Materialize foreign interop declarations from a metadata manifest"
)]
pub struct CliArgs {
    /// Interop library manifest (JSON).
    pub manifest: PathBuf,

    /// Path to a stubir.json config. Defaults to ./stubir.json when present.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Materialize only these entities (dotted names). Defaults to every
    /// top-level entity of the library.
    #[arg(short = 'e', long = "entity", value_name = "FQ_NAME")]
    pub entities: Vec<String>,

    /// Entities handled by the host compiler; never materialized.
    #[arg(long = "special", value_name = "FQ_NAME")]
    pub special: Vec<String>,

    /// Names reserved in every package scope.
    #[arg(long = "reserve", value_name = "NAME")]
    pub reserved: Vec<String>,

    /// Module name recorded in the output.
    #[arg(long = "module-name")]
    pub module_name: Option<String>,

    /// File name of the per-package container for bridged classes.
    #[arg(long = "objc-file-name")]
    pub objc_file_name: Option<String>,

    /// Output format.
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
