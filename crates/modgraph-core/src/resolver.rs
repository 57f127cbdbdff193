//! Dependency resolution against a loaded registry

use crate::dependency::{Dependency, DependencyKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ModgraphError, Result};
use crate::module::Module;
use crate::registry::Registry;
use tracing::trace;

/// Resolves dependency edges to modules
///
/// Stateless apart from the borrowed registry; cheap to create per query.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Modules matching `dep`, in code-base order
    ///
    /// Special tokens match nothing. Version compares are carried on the
    /// dependency but do not take part in matching.
    pub fn candidates(&self, dep: &Dependency) -> Vec<&'a Module> {
        if dep.special {
            return Vec::new();
        }

        match dep.kind {
            DependencyKind::Direct => self
                .registry
                .get(&dep.target)
                .filter(|module| dep.range.map_or(true, |range| range.contains(module.major)))
                .into_iter()
                .collect(),
            DependencyKind::Requires | DependencyKind::Recommends => {
                self.registry.providers_of(&dep.target).collect()
            }
        }
    }

    /// Resolve a dependency with no known referrer
    pub fn resolve(&self, dep: &Dependency) -> Result<Vec<&'a Module>> {
        self.resolve_checked(None, dep, None)
    }

    /// Resolve a dependency declared by `referrer`
    ///
    /// An unresolved recommendation is reported to `diagnostics` rather than
    /// failing.
    pub fn resolve_for(
        &self,
        referrer: &Module,
        dep: &Dependency,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<&'a Module>> {
        self.resolve_checked(Some(referrer), dep, Some(diagnostics))
    }

    /// Distinct targets of every dependency `module` declares
    pub fn resolve_module(&self, module: &Module, diagnostics: &mut Diagnostics) -> Result<Vec<&'a Module>> {
        let mut targets: Vec<&'a Module> = Vec::new();
        for dep in &module.depends_on {
            for target in self.resolve_for(module, dep, diagnostics)? {
                if !targets.iter().any(|t| t.code_base == target.code_base) {
                    targets.push(target);
                }
            }
        }
        targets.sort_by(|a, b| a.code_base.cmp(&b.code_base));
        Ok(targets)
    }

    fn resolve_checked(
        &self,
        referrer: Option<&Module>,
        dep: &Dependency,
        diagnostics: Option<&mut Diagnostics>,
    ) -> Result<Vec<&'a Module>> {
        let found = self.candidates(dep);
        trace!(dependency = %dep, matches = found.len(), "resolved");

        if found.is_empty() && !dep.special {
            let referrer_name = referrer.map(|m| m.code_base.as_str());
            if dep.kind.is_mandatory() {
                return Err(ModgraphError::unsatisfied(dep, referrer_name));
            }
            if let (Some(diagnostics), Some(referrer)) = (diagnostics, referrer) {
                diagnostics.push(
                    DiagnosticKind::UnresolvedRecommends,
                    &referrer.code_base,
                    format!("{} recommends {} but no module provides it", referrer.code_base, dep.target),
                );
            }
        }
        Ok(found)
    }
}
