//! Package classification against declared public package patterns

use crate::error::{ModgraphError, Result};
use crate::module::{Module, PackagePattern};
use std::collections::BTreeSet;

/// Exported namespace paths of `module` among `packages`
///
/// A module without declared patterns exports nothing here; callers that
/// treat such modules as fully public must do so themselves. The default
/// (empty) package is never exported.
pub fn classify(module: &Module, packages: &BTreeSet<String>) -> BTreeSet<String> {
    let Some(patterns) = &module.public_packages else {
        return BTreeSet::new();
    };

    packages
        .iter()
        .filter(|path| !path.is_empty())
        .filter(|path| matching_pattern(patterns, path).is_some())
        .cloned()
        .collect()
}

/// First pattern covering `path`, walking from the path up to the root
pub fn matching_pattern<'a>(patterns: &'a [PackagePattern], path: &str) -> Option<&'a PackagePattern> {
    let mut current = path;
    loop {
        let exact = current == path;
        if let Some(found) = patterns
            .iter()
            .find(|p| p.prefix == current && (exact || p.recursive))
        {
            return Some(found);
        }
        if current.is_empty() {
            return None;
        }
        current = current.rsplit_once('/').map_or("", |(parent, _)| parent);
    }
}

/// Check that exact patterns name real packages
///
/// Only applies when every declared pattern is non-recursive: each one must
/// then match a distinct actual package.
pub fn validate(module: &Module, packages: &BTreeSet<String>) -> Result<()> {
    let Some(patterns) = &module.public_packages else {
        return Ok(());
    };
    if patterns.iter().any(|p| p.recursive) {
        return Ok(());
    }

    match patterns.iter().find(|p| !packages.contains(&p.prefix)) {
        Some(missing) => Err(ModgraphError::UndeclaredPackage {
            module: module.code_base.clone(),
            pattern: missing.to_dotted(),
        }),
        None => Ok(()),
    }
}

/// `a/b/c` as `a.b.c`
pub fn to_dotted(path: &str) -> String {
    path.replace('/', ".")
}
