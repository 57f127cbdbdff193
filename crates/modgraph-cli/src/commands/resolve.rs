//! Resolve command - show which modules satisfy a dependency token

use anyhow::{Context, Result};
use modgraph_core::{Dependency, DependencyKind, ModuleRef};
use std::path::PathBuf;

/// Arguments for `modgraph resolve`
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    /// Dependency token, e.g. `org.example.api/1-2 > 1.5`
    pub token: String,
    pub kind: DependencyKind,
    pub scans: Vec<PathBuf>,
    pub json: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let config = super::load_config()?;
    let scans = super::scan_paths(&config, args.scans)?;
    let registry = super::load_registry(&scans, config.special_tokens())?;

    let dependency = Dependency::parse("<command line>", &args.token, args.kind, registry.special_tokens())
        .with_context(|| format!("Invalid dependency token: {}", args.token))?;

    let matches: Vec<ModuleRef> = registry
        .resolver()
        .resolve(&dependency)?
        .into_iter()
        .map(ModuleRef::from)
        .collect();

    if args.json {
        let json = serde_json::json!({
            "dependency": &dependency,
            "matches": &matches,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if dependency.special && matches.is_empty() {
        println!("{} is a special token satisfied by the platform", dependency.target);
    } else if matches.is_empty() {
        eprintln!("No module provides {}", dependency.target);
    }
    for module in &matches {
        println!("MODULE {} ({})", module.code_name, module.group);
    }
    Ok(())
}
