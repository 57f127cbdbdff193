pub mod check;
pub mod report;
pub mod resolve;
pub mod run;

use anyhow::{bail, Context, Result};
use modgraph_config::{Config, ConfigLoader, OutputFormat};
use modgraph_core::{Diagnostics, Outcome, Registry, RegistryLoader, ScanCache, SpecialTokens};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load modgraph.toml (if any) from the current directory upwards
pub fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load modgraph configuration")
}

/// Scan files from the command line, falling back to the project's inputs
pub fn scan_paths(config: &Config, explicit: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let scans = if explicit.is_empty() {
        config.scan_paths()
    } else {
        explicit
    };
    if scans.is_empty() {
        bail!("No scan files given; pass --scan or list them under [inputs] in modgraph.toml");
    }
    Ok(scans)
}

/// Parse every scan file and build the registry
pub fn load_registry(scans: &[PathBuf], specials: SpecialTokens) -> Result<Registry> {
    let mut cache = ScanCache::new();
    let mut loader = RegistryLoader::new().with_special_tokens(specials);

    for path in scans {
        let scan = cache
            .load(path)
            .with_context(|| format!("Failed to read scan file: {}", path.display()))?;
        loader
            .add_scan(&scan)
            .with_context(|| format!("Invalid module facts in {}", path.display()))?;
    }

    let registry = loader.load().context("Failed to load module registry")?;
    info!(modules = registry.len(), scans = scans.len(), "registry loaded");
    Ok(registry)
}

/// Render a report outcome in the requested format
pub fn render(outcome: &Outcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(outcome.report.to_string()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(outcome).context("Failed to serialize report")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write rendered output to a file (creating parent directories) or stdout
pub fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {}", path.display()))
        }
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Print warnings to stderr
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diag in diagnostics {
        eprintln!("{}", diag);
    }
}
