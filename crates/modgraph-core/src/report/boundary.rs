//! Cluster boundary check
//!
//! A module may depend on modules of its own group and of the groups its
//! group lists as allowed upstream. Any other edge is a violation. The
//! check only reports; whether a violation blocks a build is up to the
//! caller.

use super::AnalysisOptions;
use crate::dependency::DependencyKind;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::registry::Registry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Upstream groups each group may depend on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterPolicy {
    allowed: BTreeMap<String, BTreeSet<String>>,
}

impl ClusterPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `group` to depend on each of `upstream`
    pub fn allow<I, S>(mut self, group: impl Into<String>, upstream: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .entry(group.into())
            .or_default()
            .extend(upstream.into_iter().map(Into::into));
        self
    }

    pub fn is_allowed(&self, from: &str, to: &str) -> bool {
        from == to
            || self
                .allowed
                .get(from)
                .is_some_and(|upstream| upstream.contains(to))
    }
}

/// Dependency edge crossing a disallowed group boundary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Violation {
    pub from: String,
    pub from_group: String,
    pub to: String,
    pub to_group: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.from, self.to)
    }
}

/// Disallowed cross-group edges of in-scope modules
///
/// Recommendations and special tokens never count.
pub fn reverse_dependencies(
    registry: &Registry,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Violation>> {
    let resolver = registry.resolver();
    let mut violations = BTreeSet::new();

    for module in registry.modules().filter(|m| options.in_scope(&m.group)) {
        for dep in module
            .depends_on
            .iter()
            .filter(|dep| dep.kind != DependencyKind::Recommends && !dep.special)
        {
            for target in resolver.resolve_for(module, dep, diagnostics)? {
                if options.cluster_policy.is_allowed(&module.group, &target.group) {
                    continue;
                }
                let violation = Violation {
                    from: module.code_base.clone(),
                    from_group: module.group.clone(),
                    to: target.code_base.clone(),
                    to_group: target.group.clone(),
                };
                if violations.insert(violation) {
                    diagnostics.push(
                        DiagnosticKind::ClusterBoundary,
                        &module.code_base,
                        format!(
                            "{} ({}) depends on {} ({}), which is not an allowed upstream group",
                            module.code_base, module.group, target.code_base, target.group
                        ),
                    );
                }
            }
        }
    }

    Ok(violations.into_iter().collect())
}
