//! Public, friend and shared package reports

use super::{AnalysisOptions, ModuleRef};
use crate::classifier::{classify, to_dotted};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::module::Module;
use crate::registry::Registry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A module allowed to use friend packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Friend {
    /// Friend known to the registry
    Module { code_base: String, group: String },
    /// Friend not present in any scan
    External { code_base: String },
}

impl Friend {
    fn is_cross_group(&self, group: &str) -> bool {
        match self {
            Friend::Module { group: other, .. } => other != group,
            Friend::External { .. } => true,
        }
    }
}

impl fmt::Display for Friend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Friend::Module { code_base, group } => write!(f, "FRIEND {} ({})", code_base, group),
            Friend::External { code_base } => write!(f, "EXTERNAL {}", code_base),
        }
    }
}

/// Friend-restricted module with its friends and exported packages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendExport {
    pub module: ModuleRef,
    pub friends: Vec<Friend>,
    /// Cross-group friend count, set only when it exceeds the limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excessive_friends: Option<usize>,
    pub packages: Vec<String>,
}

impl fmt::Display for FriendExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MODULE {} ({})", self.module.code_base, self.module.group)?;
        for friend in &self.friends {
            writeln!(f, "  {}", friend)?;
        }
        if let Some(count) = self.excessive_friends {
            writeln!(f, "  WARNING: excessive number of intercluster friends ({})", count)?;
        }
        for package in &self.packages {
            writeln!(f, "  PACKAGE {}", package)?;
        }
        Ok(())
    }
}

/// Exported paths of a module, treating a module without patterns as
/// exporting everything it contains
fn exported_paths(registry: &Registry, module: &Module) -> BTreeSet<String> {
    let Some(packages) = registry.packages_of(&module.code_base) else {
        return BTreeSet::new();
    };
    match module.public_packages {
        Some(_) => classify(module, packages),
        None => packages.iter().filter(|p| !p.is_empty()).cloned().collect(),
    }
}

/// Dotted packages exported to everyone by in-scope modules without friends
pub fn public_packages(registry: &Registry, options: &AnalysisOptions) -> Vec<String> {
    let packages: BTreeSet<String> = registry
        .modules()
        .filter(|m| options.in_scope(&m.group) && !m.has_friends())
        .flat_map(|m| exported_paths(registry, m))
        .map(|path| to_dotted(&path))
        .collect();
    packages.into_iter().collect()
}

/// Friend-restricted modules with their friends and packages
///
/// With `cross_group_only`, only friends outside the module's group are
/// listed and modules without such friends are left out.
pub fn friend_packages(
    registry: &Registry,
    options: &AnalysisOptions,
    cross_group_only: bool,
    diagnostics: &mut Diagnostics,
) -> Vec<FriendExport> {
    let mut exports = Vec::new();

    for module in registry.modules().filter(|m| options.in_scope(&m.group)) {
        let Some(friend_names) = &module.friends else {
            continue;
        };

        let friends: Vec<Friend> = friend_names
            .iter()
            .map(|name| match registry.get(name) {
                Some(friend) => Friend::Module {
                    code_base: friend.code_base.clone(),
                    group: friend.group.clone(),
                },
                None => Friend::External {
                    code_base: name.clone(),
                },
            })
            .filter(|friend| !cross_group_only || friend.is_cross_group(&module.group))
            .collect();

        if cross_group_only && friends.is_empty() {
            continue;
        }

        let cross_group = friends
            .iter()
            .filter(|friend| friend.is_cross_group(&module.group))
            .count();
        let excessive_friends = options
            .max_friends
            .filter(|limit| cross_group > *limit)
            .map(|_| cross_group);

        if let Some(count) = excessive_friends {
            diagnostics.push(
                DiagnosticKind::ExcessiveFriends,
                &module.code_base,
                format!(
                    "{} has {} intercluster friends, more than the limit of {}",
                    module.code_base,
                    count,
                    options.max_friends.unwrap_or_default()
                ),
            );
        }

        exports.push(FriendExport {
            module: ModuleRef::from(module),
            friends,
            excessive_friends,
            packages: exported_paths(registry, module)
                .iter()
                .map(|path| to_dotted(path))
                .collect(),
        });
    }
    exports
}

/// Dotted packages contained in more than one in-scope module
pub fn shared_packages(registry: &Registry, options: &AnalysisOptions) -> Vec<String> {
    let mut owners: BTreeMap<String, usize> = BTreeMap::new();
    for module in registry.modules().filter(|m| options.in_scope(&m.group)) {
        let Some(packages) = registry.packages_of(&module.code_base) else {
            continue;
        };
        for path in packages.iter().filter(|p| !p.is_empty()) {
            *owners.entry(to_dotted(path)).or_default() += 1;
        }
    }

    owners
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(package, _)| package)
        .collect()
}
