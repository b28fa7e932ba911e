//! Tracing configuration for debugging materialization.
//!
//! Supports three output formats controlled by `STUBIR_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`
//! - `json`: One JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Follow re-entrant materialization as a tree
//! STUBIR_LOG=debug STUBIR_LOG_FORMAT=tree stubir libcolors.json
//!
//! # JSON (for tooling or sharing full traces)
//! STUBIR_LOG=trace STUBIR_LOG_FORMAT=json stubir libcolors.json
//!
//! # Fine-grained filtering
//! STUBIR_LOG="stubir_provider=trace,stubir_names=debug" stubir libcolors.json
//! ```
//!
//! The subscriber is only initialised when `STUBIR_LOG` (or `RUST_LOG`) is
//! set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse from the `STUBIR_LOG_FORMAT` environment variable.
    fn from_env() -> Self {
        Self::parse(&std::env::var("STUBIR_LOG_FORMAT").unwrap_or_default())
    }

    /// Unknown values fall back to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Build an `EnvFilter` from `STUBIR_LOG`, falling back to `RUST_LOG`.
///
/// `STUBIR_LOG` takes precedence when both are set. Values use the same
/// syntax as `RUST_LOG` (e.g. `debug`, `stubir_provider=trace`).
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("STUBIR_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `STUBIR_LOG` nor `RUST_LOG` is set.
///
/// All output goes to stderr so it never interferes with the declaration
/// report on stdout.
pub fn init_tracing() {
    let has_stubir_log = std::env::var("STUBIR_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_stubir_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    let format = LogFormat::from_env();

    match format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogFormat;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Text);
    }
}
