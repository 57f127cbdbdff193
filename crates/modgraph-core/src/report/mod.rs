//! Report catalogue
//!
//! Every [`ReportKind`] is a pure function of the registry and the
//! [`AnalysisOptions`]. [`Analyzer::run`] dispatches on the kind and returns
//! the [`Report`] with the warnings gathered while building it.

pub mod autoload;
pub mod boundary;
pub mod dependencies;
pub mod kits;
pub mod packages;

pub use autoload::GroupAutoloads;
pub use boundary::{ClusterPolicy, Violation};
pub use dependencies::{GroupDependencies, ModuleDependencies, Required};
pub use kits::KitContents;
pub use packages::{Friend, FriendExport};

use crate::closure::transitive_closure;
use crate::diagnostics::Diagnostics;
use crate::error::{ModgraphError, Result};
use crate::module::Module;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Closed set of report types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    PublicPackages,
    FriendPackages,
    GroupFriendPackages,
    SharedPackages,
    Modules,
    Dependencies,
    ImplementationDependencies,
    GroupDependencies,
    GroupImplementationDependencies,
    Kits,
    DisabledAutoloads,
    ReverseDependencies,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        ReportKind::PublicPackages,
        ReportKind::FriendPackages,
        ReportKind::GroupFriendPackages,
        ReportKind::SharedPackages,
        ReportKind::Modules,
        ReportKind::Dependencies,
        ReportKind::ImplementationDependencies,
        ReportKind::GroupDependencies,
        ReportKind::GroupImplementationDependencies,
        ReportKind::Kits,
        ReportKind::DisabledAutoloads,
        ReportKind::ReverseDependencies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::PublicPackages => "public-packages",
            ReportKind::FriendPackages => "friend-packages",
            ReportKind::GroupFriendPackages => "group-friend-packages",
            ReportKind::SharedPackages => "shared-packages",
            ReportKind::Modules => "modules",
            ReportKind::Dependencies => "dependencies",
            ReportKind::ImplementationDependencies => "implementation-dependencies",
            ReportKind::GroupDependencies => "group-dependencies",
            ReportKind::GroupImplementationDependencies => "group-implementation-dependencies",
            ReportKind::Kits => "kits",
            ReportKind::DisabledAutoloads => "disabled-autoloads",
            ReportKind::ReverseDependencies => "reverse-dependencies",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ModgraphError;

    fn from_str(s: &str) -> Result<Self> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ModgraphError::UnknownReport(s.to_string()))
    }
}

/// Inputs shared by every report
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Groups whose modules are reported; `None` reports every group
    pub generate: Option<BTreeSet<String>>,
    /// Cross-group friend count above which a warning is emitted
    pub max_friends: Option<usize>,
    pub cluster_policy: ClusterPolicy,
}

impl AnalysisOptions {
    pub fn in_scope(&self, group: &str) -> bool {
        self.generate
            .as_ref()
            .map_or(true, |groups| groups.contains(group))
    }
}

/// Module identity as printed in reports
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ModuleRef {
    pub code_base: String,
    pub code_name: String,
    pub group: String,
}

impl From<&Module> for ModuleRef {
    fn from(module: &Module) -> Self {
        Self {
            code_base: module.code_base.clone(),
            code_name: module.code_name(),
            group: module.group.clone(),
        }
    }
}

/// Output of one report kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", content = "entries", rename_all = "kebab-case")]
pub enum Report {
    PublicPackages(Vec<String>),
    FriendPackages(Vec<FriendExport>),
    GroupFriendPackages(Vec<FriendExport>),
    SharedPackages(Vec<String>),
    Modules(Vec<ModuleRef>),
    Dependencies(Vec<ModuleDependencies>),
    ImplementationDependencies(Vec<ModuleDependencies>),
    GroupDependencies(Vec<GroupDependencies>),
    GroupImplementationDependencies(Vec<GroupDependencies>),
    Kits(Vec<KitContents>),
    DisabledAutoloads(Vec<GroupAutoloads>),
    ReverseDependencies(Vec<Violation>),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::PublicPackages(_) => ReportKind::PublicPackages,
            Report::FriendPackages(_) => ReportKind::FriendPackages,
            Report::GroupFriendPackages(_) => ReportKind::GroupFriendPackages,
            Report::SharedPackages(_) => ReportKind::SharedPackages,
            Report::Modules(_) => ReportKind::Modules,
            Report::Dependencies(_) => ReportKind::Dependencies,
            Report::ImplementationDependencies(_) => ReportKind::ImplementationDependencies,
            Report::GroupDependencies(_) => ReportKind::GroupDependencies,
            Report::GroupImplementationDependencies(_) => ReportKind::GroupImplementationDependencies,
            Report::Kits(_) => ReportKind::Kits,
            Report::DisabledAutoloads(_) => ReportKind::DisabledAutoloads,
            Report::ReverseDependencies(_) => ReportKind::ReverseDependencies,
        }
    }

    /// Number of top-level entries
    pub fn len(&self) -> usize {
        match self {
            Report::PublicPackages(v) | Report::SharedPackages(v) => v.len(),
            Report::FriendPackages(v) | Report::GroupFriendPackages(v) => v.len(),
            Report::Modules(v) => v.len(),
            Report::Dependencies(v) | Report::ImplementationDependencies(v) => v.len(),
            Report::GroupDependencies(v) | Report::GroupImplementationDependencies(v) => v.len(),
            Report::Kits(v) => v.len(),
            Report::DisabledAutoloads(v) => v.len(),
            Report::ReverseDependencies(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn write_all<T: fmt::Display>(f: &mut fmt::Formatter<'_>, entries: &[T]) -> fmt::Result {
    entries.iter().try_for_each(|entry| write!(f, "{}", entry))
}

/// Plain text rendering, one `\n`-terminated line per item
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::PublicPackages(packages) | Report::SharedPackages(packages) => packages
                .iter()
                .try_for_each(|package| writeln!(f, "{}", package)),
            Report::FriendPackages(v) | Report::GroupFriendPackages(v) => write_all(f, v),
            Report::Modules(modules) => modules
                .iter()
                .try_for_each(|m| writeln!(f, "MODULE {} ({})", m.code_name, m.group)),
            Report::Dependencies(v) | Report::ImplementationDependencies(v) => write_all(f, v),
            Report::GroupDependencies(v) | Report::GroupImplementationDependencies(v) => {
                write_all(f, v)
            }
            Report::Kits(v) => write_all(f, v),
            Report::DisabledAutoloads(v) => write_all(f, v),
            Report::ReverseDependencies(v) => write_all(f, v),
        }
    }
}

/// A report together with the warnings raised while producing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub report: Report,
    pub diagnostics: Diagnostics,
}

/// Runs reports against one registry
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    registry: &'a Registry,
    options: &'a AnalysisOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(registry: &'a Registry, options: &'a AnalysisOptions) -> Self {
        Self { registry, options }
    }

    pub fn run(&self, kind: ReportKind) -> Result<Outcome> {
        let registry = self.registry;
        let options = self.options;
        let mut diagnostics = Diagnostics::new();

        let report = match kind {
            ReportKind::PublicPackages => {
                Report::PublicPackages(packages::public_packages(registry, options))
            }
            ReportKind::FriendPackages => Report::FriendPackages(packages::friend_packages(
                registry,
                options,
                false,
                &mut diagnostics,
            )),
            ReportKind::GroupFriendPackages => Report::GroupFriendPackages(
                packages::friend_packages(registry, options, true, &mut diagnostics),
            ),
            ReportKind::SharedPackages => {
                Report::SharedPackages(packages::shared_packages(registry, options))
            }
            ReportKind::Modules => Report::Modules(
                registry
                    .modules()
                    .filter(|m| options.in_scope(&m.group))
                    .map(ModuleRef::from)
                    .collect(),
            ),
            ReportKind::Dependencies => Report::Dependencies(dependencies::module_dependencies(
                registry,
                options,
                false,
                &mut diagnostics,
            )?),
            ReportKind::ImplementationDependencies => Report::ImplementationDependencies(
                dependencies::module_dependencies(registry, options, true, &mut diagnostics)?,
            ),
            ReportKind::GroupDependencies => Report::GroupDependencies(
                dependencies::group_dependencies(registry, options, false, &mut diagnostics)?,
            ),
            ReportKind::GroupImplementationDependencies => {
                Report::GroupImplementationDependencies(dependencies::group_dependencies(
                    registry,
                    options,
                    true,
                    &mut diagnostics,
                )?)
            }
            ReportKind::Kits => Report::Kits(kits::kit_contents(registry, options, &mut diagnostics)?),
            ReportKind::DisabledAutoloads => Report::DisabledAutoloads(
                autoload::disabled_autoloads(registry, options, &mut diagnostics)?,
            ),
            ReportKind::ReverseDependencies => Report::ReverseDependencies(
                boundary::reverse_dependencies(registry, options, &mut diagnostics)?,
            ),
        };

        info!(
            report = %kind,
            entries = report.len(),
            warnings = diagnostics.len(),
            "report generated"
        );
        Ok(Outcome {
            report,
            diagnostics,
        })
    }

    /// Resolve every dependency of every module and run the policy analyses
    ///
    /// Fails on the first unsatisfied mandatory dependency. Otherwise returns
    /// all warnings: unresolved recommendations, excessive friends, ambiguous
    /// kit ownership and cluster-boundary violations.
    pub fn check(&self) -> Result<Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let resolver = self.registry.resolver();
        for module in self.registry.modules() {
            resolver.resolve_module(module, &mut diagnostics)?;
        }

        for kind in [
            ReportKind::FriendPackages,
            ReportKind::Kits,
            ReportKind::ReverseDependencies,
        ] {
            diagnostics.extend(self.run(kind)?.diagnostics);
        }

        debug!(modules = self.registry.len(), warnings = diagnostics.len(), "check complete");
        Ok(diagnostics)
    }
}

/// Direct resolved targets of every module, keyed by code-base
pub(crate) fn module_adjacency(
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let resolver = registry.resolver();
    let mut adjacency = BTreeMap::new();
    for module in registry.modules() {
        let targets: BTreeSet<String> = resolver
            .resolve_module(module, diagnostics)?
            .into_iter()
            .map(|target| target.code_base.clone())
            .collect();
        adjacency.insert(module.code_base.clone(), targets);
    }
    Ok(adjacency)
}

/// Transitive dependency set of every module
pub(crate) fn module_closure(
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut adjacency = module_adjacency(registry, diagnostics)?;
    transitive_closure(&mut adjacency);
    Ok(adjacency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
        }
    }

    #[rstest]
    #[case("")]
    #[case("public")]
    #[case("PUBLIC-PACKAGES")]
    fn test_unknown_kind(#[case] name: &str) {
        assert!(matches!(
            name.parse::<ReportKind>(),
            Err(ModgraphError::UnknownReport(_))
        ));
    }

    #[test]
    fn test_kind_serde_matches_display() {
        let json = serde_json::to_string(&ReportKind::GroupImplementationDependencies).unwrap();
        assert_eq!(json, "\"group-implementation-dependencies\"");
    }

    #[test]
    fn test_scope_filter() {
        let mut options = AnalysisOptions::default();
        assert!(options.in_scope("anything"));

        options.generate = Some(BTreeSet::from(["ahoj".to_string()]));
        assert!(options.in_scope("ahoj"));
        assert!(!options.in_scope("other"));
    }

    #[test]
    fn test_report_json_is_tagged() {
        let report = Report::PublicPackages(vec!["a.b".to_string()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report"], "public-packages");
        assert_eq!(json["entries"][0], "a.b");
    }
}
