//! Disabled autoload detection

use super::{module_closure, AnalysisOptions};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::registry::Registry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Autoloads of one group that nothing regular ever enables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAutoloads {
    pub group: String,
    pub modules: Vec<String>,
}

impl fmt::Display for GroupAutoloads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GROUP {}", self.group)?;
        for module in &self.modules {
            writeln!(f, "  MODULE {}", module)?;
        }
        Ok(())
    }
}

/// Autoload modules unreachable from every regular module, by group
pub fn disabled_autoloads(
    registry: &Registry,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<GroupAutoloads>> {
    let closure = module_closure(registry, diagnostics)?;

    let enabled: BTreeSet<&str> = registry
        .modules()
        .filter(|m| m.is_regular())
        .filter_map(|m| closure.get(&m.code_base))
        .flatten()
        .map(String::as_str)
        .collect();

    let mut by_group: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for module in registry.modules() {
        if module.autoload && options.in_scope(&module.group) && !enabled.contains(module.code_base.as_str()) {
            by_group
                .entry(module.group.as_str())
                .or_default()
                .push(module.code_base.clone());
        }
    }

    Ok(by_group
        .into_iter()
        .map(|(group, modules)| GroupAutoloads {
            group: group.to_string(),
            modules,
        })
        .collect())
}
