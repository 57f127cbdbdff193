//! Check command - resolve every dependency and run the policy analyses

use anyhow::{bail, Context, Result};
use modgraph_core::Analyzer;
use std::path::PathBuf;

/// Arguments for `modgraph check`
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub scans: Vec<PathBuf>,
    /// Fail when any warning is raised
    pub deny_warnings: bool,
    pub json: bool,
}

/// Load, resolve and analyze the module set
///
/// Fatal load and resolution errors fail the command. Warnings only fail it
/// with `--deny-warnings`.
pub fn run(args: CheckArgs) -> Result<()> {
    let config = super::load_config()?;
    let scans = super::scan_paths(&config, args.scans)?;
    let registry = super::load_registry(&scans, config.special_tokens())?;
    let options = config.analysis_options();

    let diagnostics = Analyzer::new(&registry, &options)
        .check()
        .context("Dependency check failed")?;

    if args.json {
        let json = serde_json::json!({
            "modules": registry.len(),
            "diagnostics": &diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        super::print_diagnostics(&diagnostics);
        println!(
            "{} modules checked, {} warning(s)",
            registry.len(),
            diagnostics.len()
        );
    }

    if args.deny_warnings && !diagnostics.is_empty() {
        bail!("{} warning(s) denied by --deny-warnings", diagnostics.len());
    }
    Ok(())
}
