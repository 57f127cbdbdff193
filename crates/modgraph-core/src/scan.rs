//! Scan files and the scan cache
//!
//! A scan file holds the facts an archive scanner extracted from one
//! directory of module archives. The engine never opens archives itself.

use crate::error::{ModgraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Group used when neither a fact nor its scan file names one
pub const DEFAULT_GROUP: &str = "default";

/// Parsed scan file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScanFile {
    /// Default group for every module fact in this file
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub module: Vec<ModuleFacts>,
    #[serde(default)]
    pub library: Vec<LibraryFacts>,
}

/// Raw facts for one module archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModuleFacts {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    pub code_name: String,
    #[serde(default)]
    pub module_dependencies: Option<String>,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub needs: Option<String>,
    #[serde(default)]
    pub recommends: Option<String>,
    #[serde(default)]
    pub provides: Option<String>,
    #[serde(default)]
    pub friends: Option<String>,
    #[serde(default)]
    pub public_packages: Option<String>,
    #[serde(default)]
    pub specification_version: Option<String>,
    #[serde(default)]
    pub implementation_version: Option<String>,
    #[serde(default)]
    pub autoload: bool,
    #[serde(default)]
    pub eager: bool,
    #[serde(default)]
    pub essential: bool,
    #[serde(default)]
    pub show_in_autoupdate: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_category: Option<String>,
    /// Namespace paths found in the archive, `/`-separated
    #[serde(default)]
    pub packages: Vec<String>,
    /// Names of class-path extension libraries
    #[serde(default)]
    pub class_path: Vec<String>,
}

impl ModuleFacts {
    pub fn new(code_name: impl Into<String>) -> Self {
        Self {
            code_name: code_name.into(),
            ..Default::default()
        }
    }
}

/// Raw facts for a non-module library reachable through a class path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LibraryFacts {
    pub name: String,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub class_path: Vec<String>,
}

impl ScanFile {
    /// Read and parse a scan file, choosing the format by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ModgraphError::io(path, e))?;
        let mut scan = Self::parse(path, &content)?;

        if scan.group.is_none() {
            scan.group = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string);
        }
        for (index, facts) in scan.module.iter_mut().enumerate() {
            if facts.source.is_none() {
                facts.source = Some(format!("{}#{}", path.display(), index + 1));
            }
        }
        Ok(scan)
    }

    /// Parse scan content; `path` only selects the format and labels errors
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(content).map_err(|error| ModgraphError::Toml {
                path: path.to_path_buf(),
                error,
            }),
            Some("json") => serde_json::from_str(content).map_err(|error| ModgraphError::Json {
                path: path.to_path_buf(),
                error,
            }),
            _ => Err(ModgraphError::UnsupportedScanFormat(path.to_path_buf())),
        }
    }
}

/// File identity used to decide whether a cached parse is still valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: SystemTime,
    pub size: u64,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| ModgraphError::io(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| ModgraphError::io(path, e))?;
        Ok(Self {
            modified,
            size: metadata.len(),
        })
    }
}

#[derive(Debug)]
struct CachedScan {
    fingerprint: Fingerprint,
    scan: Arc<ScanFile>,
}

/// Parsed scan files keyed by path
///
/// An entry is reused while the file's modification time and size are
/// unchanged. The cache is an ordinary value; callers decide its lifetime.
#[derive(Debug, Default)]
pub struct ScanCache {
    entries: HashMap<PathBuf, CachedScan>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parsed scan for `path`, re-reading it only when changed
    pub fn load(&mut self, path: &Path) -> Result<Arc<ScanFile>> {
        let fingerprint = Fingerprint::of(path)?;

        if let Some(cached) = self.entries.get(path) {
            if cached.fingerprint == fingerprint {
                debug!(path = %path.display(), "scan cache hit");
                return Ok(Arc::clone(&cached.scan));
            }
        }

        debug!(path = %path.display(), "scan cache miss");
        let scan = Arc::new(ScanFile::from_path(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedScan {
                fingerprint,
                scan: Arc::clone(&scan),
            },
        );
        Ok(scan)
    }

    /// Drop the cached entry for `path`
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
group = "platform"

[[module]]
code-name = "org.openide.util/1"
specification-version = "9.4"
packages = ["org/openide/util"]

[[module]]
code-name = "org.openide.nodes/1"
group = "ide"
module-dependencies = "org.openide.util/1 > 9.0"
class-path = ["ext/helper.jar"]

[[library]]
name = "ext/helper.jar"
packages = ["org/helper"]
"#;

    #[test]
    fn test_parse_toml_scan() {
        let scan = ScanFile::parse(Path::new("s.toml"), SAMPLE).unwrap();
        assert_eq!(scan.group.as_deref(), Some("platform"));
        assert_eq!(scan.module.len(), 2);
        assert_eq!(scan.module[1].group.as_deref(), Some("ide"));
        assert_eq!(scan.module[1].class_path, vec!["ext/helper.jar"]);
        assert_eq!(scan.library[0].packages, vec!["org/helper"]);
    }

    #[test]
    fn test_parse_json_scan() {
        let json = r#"{"module": [{"code-name": "a/1", "autoload": true}]}"#;
        let scan = ScanFile::parse(Path::new("s.json"), json).unwrap();
        assert!(scan.module[0].autoload);
        assert_eq!(scan.group, None);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = ScanFile::parse(Path::new("s.yaml"), "").unwrap_err();
        assert!(matches!(err, ModgraphError::UnsupportedScanFormat(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ScanFile::parse(Path::new("s.toml"), "[[module]]\ncode-name = \"a\"\nbogus = 1\n")
            .unwrap_err();
        assert!(matches!(err, ModgraphError::Toml { .. }));
    }

    #[test]
    fn test_from_path_fills_group_and_sources() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extra.toml");
        fs::write(&path, "[[module]]\ncode-name = \"a\"\n").unwrap();

        let scan = ScanFile::from_path(&path).unwrap();
        assert_eq!(scan.group.as_deref(), Some("extra"));
        let source = scan.module[0].source.as_deref().unwrap();
        assert!(source.ends_with("extra.toml#1"));
    }

    #[test]
    fn test_cache_hit_returns_same_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.toml");
        fs::write(&path, SAMPLE).unwrap();

        let mut cache = ScanCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_reloads_changed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.toml");
        fs::write(&path, "[[module]]\ncode-name = \"a\"\n").unwrap();

        let mut cache = ScanCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.module.len(), 1);

        fs::write(&path, "[[module]]\ncode-name = \"a\"\n\n[[module]]\ncode-name = \"b\"\n").unwrap();
        let second = cache.load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.module.len(), 2);
    }

    #[test]
    fn test_cache_invalidate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.toml");
        fs::write(&path, SAMPLE).unwrap();

        let mut cache = ScanCache::new();
        let first = cache.load(&path).unwrap();
        cache.invalidate(&path);
        assert!(cache.is_empty());

        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cache_missing_file_is_io_error() {
        let mut cache = ScanCache::new();
        let err = cache.load(Path::new("/nonexistent/scan.toml")).unwrap_err();
        assert!(matches!(err, ModgraphError::Io { .. }));
    }
}
