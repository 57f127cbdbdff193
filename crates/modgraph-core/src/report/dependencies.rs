//! Module and group dependency reports

use super::{AnalysisOptions, ModuleRef};
use crate::dependency::Dependency;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::registry::Registry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One `REQUIRES` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Required {
    Module(ModuleRef),
    /// Platform or format marker, printed verbatim
    Token { token: String },
}

impl fmt::Display for Required {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Required::Module(module) => write!(f, "REQUIRES {} ({})", module.code_name, module.group),
            Required::Token { token } => write!(f, "REQUIRES {}", token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDependencies {
    pub module: ModuleRef,
    pub requires: Vec<Required>,
}

impl fmt::Display for ModuleDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MODULE {} ({})", self.module.code_name, self.module.group)?;
        for required in &self.requires {
            writeln!(f, "  {}", required)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDependencies {
    pub group: String,
    pub requires: Vec<ModuleRef>,
}

impl fmt::Display for GroupDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GROUP {}", self.group)?;
        for module in &self.requires {
            writeln!(f, "  REQUIRES {} ({})", module.code_name, module.group)?;
        }
        Ok(())
    }
}

fn selected(dep: &Dependency, implementation_only: bool) -> bool {
    !implementation_only || dep.is_implementation()
}

/// Declared dependencies of every in-scope module
///
/// Modules without any matching dependency are omitted. Lines are sorted
/// and deduplicated by their rendered text.
pub fn module_dependencies(
    registry: &Registry,
    options: &AnalysisOptions,
    implementation_only: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ModuleDependencies>> {
    let resolver = registry.resolver();
    let mut entries = Vec::new();

    for module in registry.modules().filter(|m| options.in_scope(&m.group)) {
        let mut requires = Vec::new();
        for dep in module
            .depends_on
            .iter()
            .filter(|dep| selected(dep, implementation_only))
        {
            if dep.special {
                requires.push(Required::Token {
                    token: dep.target.clone(),
                });
                continue;
            }
            for target in resolver.resolve_for(module, dep, diagnostics)? {
                requires.push(Required::Module(ModuleRef::from(target)));
            }
        }

        if requires.is_empty() {
            continue;
        }
        requires.sort_by_cached_key(|r| r.to_string());
        requires.dedup_by(|a, b| a.to_string() == b.to_string());

        entries.push(ModuleDependencies {
            module: ModuleRef::from(module),
            requires,
        });
    }
    Ok(entries)
}

/// Modules in other groups required directly by each in-scope group
pub fn group_dependencies(
    registry: &Registry,
    options: &AnalysisOptions,
    implementation_only: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<GroupDependencies>> {
    let resolver = registry.resolver();
    let mut by_group: BTreeMap<String, BTreeMap<String, ModuleRef>> = BTreeMap::new();

    for module in registry.modules().filter(|m| options.in_scope(&m.group)) {
        for dep in module
            .depends_on
            .iter()
            .filter(|dep| !dep.special && selected(dep, implementation_only))
        {
            for target in resolver.resolve_for(module, dep, diagnostics)? {
                if target.group == module.group {
                    continue;
                }
                by_group
                    .entry(module.group.clone())
                    .or_default()
                    .entry(target.code_base.clone())
                    .or_insert_with(|| ModuleRef::from(target));
            }
        }
    }

    Ok(by_group
        .into_iter()
        .map(|(group, targets)| GroupDependencies {
            group,
            requires: targets.into_values().collect(),
        })
        .collect())
}
