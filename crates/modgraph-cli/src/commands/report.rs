//! Report command - run one report against a set of scan files

use anyhow::{Context, Result};
use modgraph_config::OutputFormat;
use modgraph_core::{Analyzer, ReportKind};
use std::path::PathBuf;

/// Arguments for `modgraph report`
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    /// Report kind name, e.g. `kits`
    pub kind: String,
    pub scans: Vec<PathBuf>,
    /// Groups to report on; empty keeps the configured scope
    pub generate: Vec<String>,
    pub max_friends: Option<usize>,
    /// Write here instead of stdout
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: ReportArgs) -> Result<()> {
    let kind: ReportKind = args.kind.parse()?;
    let config = super::load_config()?;
    let scans = super::scan_paths(&config, args.scans)?;
    let registry = super::load_registry(&scans, config.special_tokens())?;

    // Command-line flags override configuration
    let mut options = config.analysis_options();
    if !args.generate.is_empty() {
        options.generate = Some(args.generate.into_iter().collect());
    }
    if args.max_friends.is_some() {
        options.max_friends = args.max_friends;
    }

    let outcome = Analyzer::new(&registry, &options)
        .run(kind)
        .with_context(|| format!("Failed to generate '{}' report", kind))?;

    let format = if args.json {
        OutputFormat::Json
    } else {
        config.default_format()
    };
    if format == OutputFormat::Text {
        super::print_diagnostics(&outcome.diagnostics);
    }

    let rendered = super::render(&outcome, format)?;
    super::emit(&rendered, args.output.as_deref())
}
