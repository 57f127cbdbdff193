//! Module registry and its loader
//!
//! The loader turns raw scan facts into [`Module`] records. Once
//! [`RegistryLoader::load`] returns, the [`Registry`] is read-only.

use crate::classifier;
use crate::dependency::{Dependency, DependencyKind, SpecialTokens};
use crate::error::{ModgraphError, Result};
use crate::module::{Module, PackagePattern};
use crate::resolver::Resolver;
use crate::scan::{LibraryFacts, ModuleFacts, ScanFile, DEFAULT_GROUP};
use crate::version::SpecVersion;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};

#[derive(Debug)]
struct StagedModule {
    module: Module,
    packages: BTreeSet<String>,
    class_path: Vec<String>,
}

/// Collects module and library facts before building a [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryLoader {
    specials: SpecialTokens,
    staged: BTreeMap<String, StagedModule>,
    libraries: BTreeMap<String, LibraryFacts>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom special token recognizer for dependency parsing
    pub fn with_special_tokens(mut self, specials: SpecialTokens) -> Self {
        self.specials = specials;
        self
    }

    /// Stage every module and library of a scan file
    pub fn add_scan(&mut self, scan: &ScanFile) -> Result<()> {
        let fallback = scan.group.as_deref().unwrap_or(DEFAULT_GROUP);
        for library in &scan.library {
            self.add_library(library.clone());
        }
        for facts in &scan.module {
            self.add_facts(facts, fallback)?;
        }
        Ok(())
    }

    /// Parse and stage one module fact record
    pub fn add_facts(&mut self, facts: &ModuleFacts, fallback_group: &str) -> Result<()> {
        let source = facts
            .source
            .clone()
            .unwrap_or_else(|| facts.code_name.clone());
        let (code_base, major) = Module::split_code_name(&facts.code_name, &source)?;

        let spec_version = match &facts.specification_version {
            Some(raw) => Some(raw.parse::<SpecVersion>().map_err(|_| {
                ModgraphError::MalformedVersion {
                    module: code_base.clone(),
                    version: raw.clone(),
                }
            })?),
            None => None,
        };

        let mut depends_on = Vec::new();
        for (raw, kind) in [
            (&facts.module_dependencies, DependencyKind::Direct),
            (&facts.requires, DependencyKind::Requires),
            (&facts.needs, DependencyKind::Requires),
            (&facts.recommends, DependencyKind::Recommends),
        ] {
            if let Some(raw) = raw {
                depends_on.extend(Dependency::parse_list(&code_base, raw, kind, &self.specials)?);
            }
        }

        let public_packages = facts
            .public_packages
            .as_deref()
            .map(|raw| PackagePattern::parse_list(&code_base, raw))
            .transpose()?;

        let module = Module {
            group: facts
                .group
                .clone()
                .unwrap_or_else(|| fallback_group.to_string()),
            major,
            spec_version,
            impl_version: facts.implementation_version.clone(),
            public_packages,
            friends: facts.friends.as_deref().map(split_names),
            provides: facts.provides.as_deref().map(split_names).unwrap_or_default(),
            depends_on,
            essential: facts.essential,
            autoload: facts.autoload,
            eager: facts.eager,
            show_in_autoupdate: facts.show_in_autoupdate,
            display_name: facts.display_name.clone(),
            display_category: facts.display_category.clone(),
            source,
            code_base,
        };

        self.stage(module, facts.packages.iter().cloned(), facts.class_path.clone())
    }

    /// Stage an already-built module with the namespace paths it contains
    pub fn add_module<I>(&mut self, module: Module, packages: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        self.stage(module, packages, Vec::new())
    }

    /// Stage a class-path library; a later library with the same name wins
    pub fn add_library(&mut self, library: LibraryFacts) {
        self.libraries.insert(library.name.clone(), library);
    }

    fn stage<I>(&mut self, module: Module, packages: I, class_path: Vec<String>) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(existing) = self.staged.get(&module.code_base) {
            return Err(ModgraphError::DuplicateModule {
                code_base: module.code_base.clone(),
                first: existing.module.source.clone(),
                second: module.source.clone(),
            });
        }

        debug!(module = %module.code_base, group = %module.group, "staged module");
        self.staged.insert(
            module.code_base.clone(),
            StagedModule {
                module,
                packages: packages.into_iter().map(normalize_path).collect(),
                class_path,
            },
        );
        Ok(())
    }

    /// Build the registry, resolving class paths and validating patterns
    ///
    /// Fails when a non-special `Requires` token has no provider.
    pub fn load(self) -> Result<Registry> {
        let mut modules = BTreeMap::new();
        let mut packages = BTreeMap::new();
        let mut providers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (code_base, staged) in self.staged {
            let mut effective = staged.packages;
            effective.extend(extension_packages(&code_base, &staged.class_path, &self.libraries));

            classifier::validate(&staged.module, &effective)?;

            for token in &staged.module.provides {
                providers
                    .entry(token.clone())
                    .or_default()
                    .insert(code_base.clone());
            }
            packages.insert(code_base.clone(), effective);
            modules.insert(code_base, staged.module);
        }

        check_requires(&modules, &providers)?;

        debug!(modules = modules.len(), tokens = providers.len(), "registry loaded");
        Ok(Registry {
            modules,
            packages,
            providers,
            specials: self.specials,
        })
    }
}

/// Every non-special `Requires` token must have at least one provider
fn check_requires(
    modules: &BTreeMap<String, Module>,
    providers: &BTreeMap<String, BTreeSet<String>>,
) -> Result<()> {
    for (code_base, module) in modules {
        let unsatisfied = module.depends_on.iter().find(|dep| {
            dep.kind == DependencyKind::Requires
                && !dep.special
                && providers.get(&dep.target).map_or(true, BTreeSet::is_empty)
        });
        if let Some(dep) = unsatisfied {
            return Err(ModgraphError::unsatisfied(dep, Some(code_base.as_str())));
        }
    }
    Ok(())
}

/// Packages of every library reachable through `class_path`
fn extension_packages(
    module: &str,
    class_path: &[String],
    libraries: &BTreeMap<String, LibraryFacts>,
) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut queue: VecDeque<&str> = class_path.iter().map(String::as_str).collect();

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name) {
            continue;
        }
        match libraries.get(name) {
            Some(library) => {
                found.extend(library.packages.iter().cloned().map(normalize_path));
                queue.extend(library.class_path.iter().map(String::as_str));
            }
            None => warn!(module, extension = name, "class-path extension not found, skipping"),
        }
    }
    found
}

fn split_names(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_path(path: String) -> String {
    path.trim_matches('/').to_string()
}

/// Immutable catalog of loaded modules, ordered by code-base
#[derive(Debug, Clone)]
pub struct Registry {
    modules: BTreeMap<String, Module>,
    packages: BTreeMap<String, BTreeSet<String>>,
    providers: BTreeMap<String, BTreeSet<String>>,
    specials: SpecialTokens,
}

impl Registry {
    pub fn get(&self, code_base: &str) -> Option<&Module> {
        self.modules.get(code_base)
    }

    pub fn contains(&self, code_base: &str) -> bool {
        self.modules.contains_key(code_base)
    }

    /// All modules in code-base order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Effective namespace paths of a module, class-path extensions included
    pub fn packages_of(&self, code_base: &str) -> Option<&BTreeSet<String>> {
        self.packages.get(code_base)
    }

    /// Modules providing `token`, in code-base order
    pub fn providers_of(&self, token: &str) -> impl Iterator<Item = &Module> {
        self.providers
            .get(token)
            .into_iter()
            .flatten()
            .filter_map(|code_base| self.modules.get(code_base))
    }

    /// Names of all groups with at least one module
    pub fn groups(&self) -> BTreeSet<&str> {
        self.modules.values().map(|m| m.group.as_str()).collect()
    }

    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.specials
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }
}
