//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::{DefaultsConfig, GlobalConfig};
use crate::project::{OutputConfig, OutputFormat, ProjectConfig};
use crate::{ConfigError, ConfigResult};
use modgraph_core::{AnalysisOptions, ClusterPolicy, SpecialTokens};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project file name searched for when walking up from a directory
pub const PROJECT_FILE: &str = "modgraph.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.modgraph/config.toml) - lowest priority
/// 2. Project config (./modgraph.toml) - overrides global
/// 3. Environment variables (MODGRAPH_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where modgraph.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of the one in the home directory
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find modgraph.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_config, project_root)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.finish(project_config, project_root)
    }

    fn finish(&mut self, project: ProjectConfig, project_root: Option<PathBuf>) -> ConfigResult<Config> {
        let mut global = self.load_global_config()?;
        let project = apply_env_overrides(project, &mut global)?;

        Ok(Config {
            project,
            global,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); no project file yields defaults
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                debug!(path = %config_path.display(), "found project config");
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration, defaulting when the file is absent
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply MODGRAPH_* environment overrides
///
/// `MODGRAPH_MAX_FRIENDS` and `MODGRAPH_GENERATE` override the project's
/// analysis settings; `MODGRAPH_FORMAT` overrides the global default format.
fn apply_env_overrides(
    mut project: ProjectConfig,
    global: &mut GlobalConfig,
) -> ConfigResult<ProjectConfig> {
    if let Ok(raw) = env::var("MODGRAPH_MAX_FRIENDS") {
        let limit = raw.trim().parse::<usize>().map_err(|_| {
            ConfigError::invalid(
                "MODGRAPH_MAX_FRIENDS",
                format!("expected a non-negative integer, got '{}'", raw),
            )
        })?;
        project.analysis.max_friends = Some(limit);
    }

    if let Ok(raw) = env::var("MODGRAPH_GENERATE") {
        let groups: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        project.analysis.generate = if groups.is_empty() { None } else { Some(groups) };
    }

    if let Ok(raw) = env::var("MODGRAPH_FORMAT") {
        let format = raw.parse::<OutputFormat>()?;
        global.merge(&GlobalConfig {
            defaults: Some(DefaultsConfig {
                format: Some(format),
                ..Default::default()
            }),
        });
    }

    Ok(project)
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has modgraph.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Resolve a project-relative path
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Scan files declared by the project, resolved against its root
    pub fn scan_paths(&self) -> Vec<PathBuf> {
        self.project
            .inputs
            .scans
            .iter()
            .map(|p| self.resolve_path(p))
            .collect()
    }

    /// Destination of one output, resolved against the project root
    pub fn output_path(&self, output: &OutputConfig) -> PathBuf {
        self.resolve_path(&output.file)
    }

    /// Effective friend limit (project > global)
    pub fn max_friends(&self) -> Option<usize> {
        self.project
            .analysis
            .max_friends
            .or_else(|| self.global.default_max_friends())
    }

    /// Effective default format (global or text)
    pub fn default_format(&self) -> OutputFormat {
        self.global.default_format().unwrap_or_default()
    }

    /// Format for one output (output > default)
    pub fn output_format(&self, output: &OutputConfig) -> OutputFormat {
        output.format.unwrap_or_else(|| self.default_format())
    }

    pub fn generate(&self) -> Option<BTreeSet<String>> {
        self.project
            .analysis
            .generate
            .as_ref()
            .map(|groups| groups.iter().cloned().collect())
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens::with_extra_prefixes(self.project.analysis.special_tokens.iter().cloned())
    }

    pub fn cluster_policy(&self) -> ClusterPolicy {
        self.project
            .allowed_upstream()
            .fold(ClusterPolicy::new(), |policy, (group, upstream)| {
                policy.allow(group, upstream.iter().cloned())
            })
    }

    /// Analysis options assembled from every configuration layer
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            generate: self.generate(),
            max_friends: self.max_friends(),
            cluster_policy: self.cluster_policy(),
        }
    }
}
