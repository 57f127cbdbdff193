//! Module records

use crate::dependency::Dependency;
use crate::error::{ModgraphError, Result};
use crate::version::SpecVersion;
use serde::Serialize;
use std::collections::BTreeSet;

/// Declared public package pattern
///
/// `prefix` is a `/`-separated namespace path. A recursive pattern also
/// exports every descendant of `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagePattern {
    pub prefix: String,
    pub recursive: bool,
}

impl PackagePattern {
    pub fn new(prefix: impl Into<String>, recursive: bool) -> Self {
        Self {
            prefix: prefix.into(),
            recursive,
        }
    }

    /// Parse a public package attribute such as `a.b.*, a.c.**`
    ///
    /// `-` declares the list present but empty. Duplicate entries collapse
    /// onto the first occurrence.
    pub fn parse_list(module: &str, raw: &str) -> Result<Vec<PackagePattern>> {
        if raw.trim() == "-" {
            return Ok(Vec::new());
        }

        let mut patterns: Vec<PackagePattern> = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let malformed = || ModgraphError::MalformedPattern {
                module: module.to_string(),
                entry: entry.to_string(),
            };

            let (dotted, recursive) = if let Some(stripped) = entry.strip_suffix(".**") {
                (stripped, true)
            } else if let Some(stripped) = entry.strip_suffix(".*") {
                (stripped, false)
            } else {
                return Err(malformed());
            };

            if dotted.is_empty()
                || dotted
                    .split('.')
                    .any(|segment| segment.is_empty() || segment.contains(['*', '/', ' ']))
            {
                return Err(malformed());
            }

            let pattern = PackagePattern::new(dotted.replace('.', "/"), recursive);
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        Ok(patterns)
    }

    /// The pattern as written in a manifest
    pub fn to_dotted(&self) -> String {
        let suffix = if self.recursive { ".**" } else { ".*" };
        format!("{}{}", self.prefix.replace('/', "."), suffix)
    }
}

/// One distributable unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub code_base: String,
    pub group: String,
    /// Release epoch, -1 when absent
    pub major: i32,
    pub spec_version: Option<SpecVersion>,
    pub impl_version: Option<String>,
    pub public_packages: Option<Vec<PackagePattern>>,
    pub friends: Option<BTreeSet<String>>,
    pub provides: BTreeSet<String>,
    pub depends_on: Vec<Dependency>,
    pub essential: bool,
    pub autoload: bool,
    pub eager: bool,
    pub show_in_autoupdate: bool,
    pub display_name: Option<String>,
    pub display_category: Option<String>,
    /// Archive the facts were scanned from
    pub source: String,
}

impl Module {
    /// Minimal module, mostly useful for building fixtures
    pub fn new(code_base: impl Into<String>, group: impl Into<String>) -> Self {
        let code_base = code_base.into();
        Self {
            source: code_base.clone(),
            code_base,
            group: group.into(),
            major: -1,
            spec_version: None,
            impl_version: None,
            public_packages: None,
            friends: None,
            provides: BTreeSet::new(),
            depends_on: Vec::new(),
            essential: false,
            autoload: false,
            eager: false,
            show_in_autoupdate: false,
            display_name: None,
            display_category: None,
        }
    }

    /// Split a raw `codebase[/major]` code name
    pub fn split_code_name(code_name: &str, origin: &str) -> Result<(String, i32)> {
        let malformed = |reason: &str| ModgraphError::MalformedCodeName {
            code_name: code_name.to_string(),
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        let (base, major) = match code_name.trim().split_once('/') {
            Some((base, major)) => {
                let major = major
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(|m| i32::try_from(m).ok())
                    .ok_or_else(|| malformed("major version is not a non-negative integer"))?;
                (base.trim(), major)
            }
            None => (code_name.trim(), -1),
        };

        if base.is_empty() {
            return Err(malformed("missing code name base"));
        }
        if base.contains(char::is_whitespace) {
            return Err(malformed("code name base contains whitespace"));
        }
        Ok((base.to_string(), major))
    }

    /// Code name with major version, e.g. `org.openide/1`
    pub fn code_name(&self) -> String {
        if self.major >= 0 {
            format!("{}/{}", self.code_base, self.major)
        } else {
            self.code_base.clone()
        }
    }

    /// User-visible aggregate
    pub fn is_kit(&self) -> bool {
        self.show_in_autoupdate
    }

    /// Explicitly enabled, neither autoload nor eager
    pub fn is_regular(&self) -> bool {
        !self.autoload && !self.eager
    }

    /// Candidate for kit ownership
    pub fn is_ordinary(&self) -> bool {
        !self.is_kit() && self.is_regular() && !self.essential
    }

    pub fn has_friends(&self) -> bool {
        self.friends.is_some()
    }

    pub fn provides_token(&self, token: &str) -> bool {
        self.provides.contains(token)
    }
}
