//! Kit ownership
//!
//! A kit is a module shown in the update center. Every ordinary module is
//! owned by the lowest kit it is reachable from, where "lowest" follows the
//! kit-to-kit dependency order. When the candidate kits are not totally
//! ordered the module is assigned to all of them and a warning is raised.

use super::{module_adjacency, AnalysisOptions, ModuleRef};
use crate::closure::transitive_closure;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::registry::Registry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitContents {
    pub kit: ModuleRef,
    pub modules: Vec<ModuleRef>,
}

impl fmt::Display for KitContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KIT {} ({})", self.kit.code_base, self.kit.group)?;
        for module in &self.modules {
            writeln!(f, "  MODULE {} ({})", module.code_base, module.group)?;
        }
        Ok(())
    }
}

/// Kit owning each ordinary module
///
/// Returns, per kit code-base, the modules it contains.
pub fn assign_kits(
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let is_kit = |code_base: &str| registry.get(code_base).is_some_and(|m| m.is_kit());

    let mut reach = module_adjacency(registry, diagnostics)?;
    transitive_closure(&mut reach);

    // Kits reached through ordinary modules count as kit dependencies too
    let mut kit_deps: BTreeMap<String, BTreeSet<String>> = reach
        .iter()
        .filter(|(code_base, _)| is_kit(code_base))
        .map(|(code_base, targets)| {
            let kits = targets.iter().filter(|t| is_kit(t)).cloned().collect();
            (code_base.clone(), kits)
        })
        .collect();
    transitive_closure(&mut kit_deps);

    let mut candidates: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for kit in kit_deps.keys() {
        for reached in &reach[kit] {
            if registry.get(reached).is_some_and(|m| m.is_ordinary()) {
                candidates.entry(reached).or_default().insert(kit);
            }
        }
    }

    let mut contents: BTreeMap<String, BTreeSet<String>> = kit_deps
        .keys()
        .map(|kit| (kit.clone(), BTreeSet::new()))
        .collect();

    for (module, kits) in candidates {
        let depends_on = |from: &str, to: &str| kit_deps.get(from).is_some_and(|deps| deps.contains(to));

        let mut lowest = match kits.first() {
            Some(first) => *first,
            None => continue,
        };
        for &candidate in &kits {
            if candidate != lowest && depends_on(lowest, candidate) {
                lowest = candidate;
            }
        }

        let missing: Vec<String> = kits
            .iter()
            .filter(|&&kit| kit != lowest && !depends_on(kit, lowest))
            .map(|kit| format!("{} -> {}", kit, lowest))
            .collect();

        if missing.is_empty() {
            debug!(module, kit = lowest, "assigned to kit");
            if let Some(owned) = contents.get_mut(lowest) {
                owned.insert(module.to_string());
            }
            continue;
        }

        diagnostics.push(
            DiagnosticKind::AmbiguousKitOwnership,
            module,
            format!(
                "{} is reachable from kits {} with no lowest one (lowest candidate {}); missing dependencies: {}",
                module,
                kits.iter().copied().collect::<Vec<_>>().join(", "),
                lowest,
                missing.join(", ")
            ),
        );
        for kit in kits {
            if let Some(owned) = contents.get_mut(kit) {
                owned.insert(module.to_string());
            }
        }
    }

    Ok(contents)
}

/// In-scope kits with their modules
pub fn kit_contents(
    registry: &Registry,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<KitContents>> {
    let contents = assign_kits(registry, diagnostics)?;

    Ok(contents
        .into_iter()
        .filter_map(|(kit, modules)| {
            let kit = registry.get(&kit)?;
            if !options.in_scope(&kit.group) {
                return None;
            }
            Some(KitContents {
                kit: ModuleRef::from(kit),
                modules: modules
                    .iter()
                    .filter_map(|m| registry.get(m))
                    .map(ModuleRef::from)
                    .collect(),
            })
        })
        .collect())
}
