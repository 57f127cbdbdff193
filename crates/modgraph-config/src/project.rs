//! Project Configuration (modgraph.toml)
//!
//! Handles project-level configuration stored in `modgraph.toml` at the
//! project root: scan inputs, analysis settings, group policy and the
//! reports to write.

use crate::{ConfigError, ConfigResult};
use modgraph_core::ReportKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Project configuration from modgraph.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Scan inputs
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Per-group policy, keyed by group name
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupConfig>,

    /// Reports written by `modgraph run`
    #[serde(default, rename = "output")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputConfig>,
}

/// Scan file inputs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    /// Scan files, relative to the project root
    #[serde(default)]
    pub scans: Vec<PathBuf>,
}

/// Analysis settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Cross-group friend limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_friends: Option<usize>,

    /// Groups to report on (all when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate: Option<Vec<String>>,

    /// Extra special token prefixes
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub special_tokens: Vec<String>,
}

/// Policy for one group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GroupConfig {
    /// Groups this group may depend on
    #[serde(default)]
    pub allowed_upstream: Vec<String>,
}

/// Report output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::invalid(
                "format",
                format!("must be 'text' or 'json', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// One report to write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(rename = "type")]
    pub kind: ReportKind,

    /// Destination, relative to the project root
    pub file: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::TomlParseError { error, .. } => ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: PathBuf::from("modgraph.toml"),
            error: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(generate) = &self.analysis.generate {
            check_group_names("analysis.generate", generate)?;
        }

        if self.analysis.special_tokens.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "analysis.special-tokens",
                "prefixes must not be empty",
            ));
        }

        for (group, policy) in &self.groups {
            if group.trim().is_empty() {
                return Err(ConfigError::invalid("groups", "group names must not be empty"));
            }
            check_group_names(&format!("groups.{}.allowed-upstream", group), &policy.allowed_upstream)?;
        }

        let mut files = BTreeSet::new();
        for output in &self.outputs {
            if output.file.as_os_str().is_empty() {
                return Err(ConfigError::invalid(
                    "output.file",
                    format!("missing file for '{}' report", output.kind),
                ));
            }
            if !files.insert(&output.file) {
                return Err(ConfigError::invalid(
                    "output.file",
                    format!("'{}' is written by more than one report", output.file.display()),
                ));
            }
        }

        Ok(())
    }

    /// Allowed upstream groups, keyed by group
    pub fn allowed_upstream(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(group, policy)| (group.as_str(), policy.allowed_upstream.as_slice()))
    }
}

fn check_group_names(field: &str, names: &[String]) -> ConfigResult<()> {
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::invalid(field, "group names must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_full_project_config() {
        let config = ProjectConfig::parse(
            r#"
[inputs]
scans = ["scans/platform.toml", "scans/ide.json"]

[analysis]
max-friends = 3
generate = ["platform"]
special-tokens = ["com.example.marker."]

[groups.ide]
allowed-upstream = ["platform"]

[[output]]
type = "kits"
file = "out/kits.txt"

[[output]]
type = "public-packages"
file = "out/public.json"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.inputs.scans.len(), 2);
        assert_eq!(config.analysis.max_friends, Some(3));
        assert_eq!(config.analysis.generate, Some(vec!["platform".to_string()]));
        assert_eq!(config.groups["ide"].allowed_upstream, vec!["platform"]);
        assert_eq!(config.outputs[0].kind, ReportKind::Kits);
        assert_eq!(config.outputs[1].format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert_eq!(ProjectConfig::parse("").unwrap(), ProjectConfig::default());
    }

    #[rstest]
    #[case("[analysis]\nbogus = 1\n")]
    #[case("[[output]]\ntype = \"no-such-report\"\nfile = \"x\"\n")]
    #[case("[[output]]\ntype = \"kits\"\nfile = \"x\"\nformat = \"yaml\"\n")]
    fn test_rejected_by_schema(#[case] content: &str) {
        assert!(matches!(
            ProjectConfig::parse(content),
            Err(ConfigError::TomlParseError { .. })
        ));
    }

    #[rstest]
    #[case("[analysis]\ngenerate = [\"\"]\n")]
    #[case("[groups.ide]\nallowed-upstream = [\" \"]\n")]
    #[case("[[output]]\ntype = \"kits\"\nfile = \"\"\n")]
    #[case("[[output]]\ntype = \"kits\"\nfile = \"a\"\n\n[[output]]\ntype = \"modules\"\nfile = \"a\"\n")]
    fn test_rejected_by_validation(#[case] content: &str) {
        assert!(matches!(
            ProjectConfig::parse(content),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
