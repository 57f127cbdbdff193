//! Run command - write every report listed in modgraph.toml

use anyhow::{bail, Context, Result};
use modgraph_core::{Analyzer, Diagnostics};
use tracing::info;

pub fn run() -> Result<()> {
    let config = super::load_config()?;
    if !config.is_project() {
        bail!("No modgraph.toml found in this directory or any parent");
    }
    if config.project.outputs.is_empty() {
        println!("Nothing to do: modgraph.toml declares no [[output]] entries");
        return Ok(());
    }

    let scans = super::scan_paths(&config, Vec::new())?;
    let registry = super::load_registry(&scans, config.special_tokens())?;
    let options = config.analysis_options();
    let analyzer = Analyzer::new(&registry, &options);

    let mut diagnostics = Diagnostics::new();
    for output in &config.project.outputs {
        let outcome = analyzer
            .run(output.kind)
            .with_context(|| format!("Failed to generate '{}' report", output.kind))?;

        let path = config.output_path(output);
        let rendered = super::render(&outcome, config.output_format(output))?;
        super::emit(&rendered, Some(&path))?;

        info!(report = %output.kind, entries = outcome.report.len(), "report written");
        println!("Wrote {} ({})", path.display(), output.kind);
        diagnostics.extend(outcome.diagnostics);
    }

    super::print_diagnostics(&diagnostics);
    Ok(())
}
