use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use stubir::cli::args::{CliArgs, OutputFormat};
use stubir::cli::driver;
use stubir::cli::reporter::Reporter;

fn main() -> Result<()> {
    // STUBIR_LOG / STUBIR_LOG_FORMAT, see src/tracing_config.rs.
    stubir::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let report = driver::run(&args, &cwd)?;

    let rendered = match args.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => {
            let color = !args.no_color && std::io::stdout().is_terminal();
            Reporter::new(color).render(&report)
        }
    };
    std::io::stdout()
        .lock()
        .write_all(rendered.as_bytes())
        .context("failed to write report")?;
    Ok(())
}
