//! Dependency records and the dependency token grammar
//!
//! A raw dependency attribute is a comma list of tokens of the form
//! `name[/major|/from-to][ > spec-version| = impl-version]`.

use crate::error::{ModgraphError, Result};
use crate::version::SpecVersion;
use serde::Serialize;
use std::fmt;

/// Marker prefixes that never resolve to real modules
pub const SPECIAL_PREFIXES: &[&str] = &[
    "org.openide.modules.os.",
    "org.openide.modules.jre.",
    "org.openide.modules.arch.",
];

/// Marker tokens that never resolve to real modules
pub const SPECIAL_TOKENS: &[&str] = &[
    "org.openide.modules.ModuleFormat1",
    "org.openide.modules.ModuleFormat2",
];

/// Kind of a declared dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// Exact module reference, may carry a major version range
    Direct,
    /// Token must be provided by some module
    Requires,
    /// Token should be provided; absence is tolerated
    Recommends,
}

impl DependencyKind {
    /// Whether an empty resolution is fatal
    pub fn is_mandatory(self) -> bool {
        !matches!(self, DependencyKind::Recommends)
    }
}

/// Inclusive major version bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MajorRange {
    pub from: i32,
    pub to: i32,
}

impl MajorRange {
    pub fn exact(major: i32) -> Self {
        Self {
            from: major,
            to: major,
        }
    }

    pub fn contains(&self, major: i32) -> bool {
        self.from <= major && major <= self.to
    }
}

impl fmt::Display for MajorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// Version constraint attached to a dependency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "compare", content = "value")]
pub enum VersionCompare {
    /// `> 4.17`: minimum specification version
    Minimum(SpecVersion),
    /// `= 200701`: exact implementation version
    Exact(String),
}

/// One declared dependency edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub target: String,
    pub kind: DependencyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<MajorRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<VersionCompare>,
    pub special: bool,
}

impl Dependency {
    /// Whether this is an implementation (`=`) dependency
    pub fn is_implementation(&self) -> bool {
        matches!(self.compare, Some(VersionCompare::Exact(_)))
    }

    /// Parse a comma separated dependency attribute
    pub fn parse_list(
        module: &str,
        raw: &str,
        kind: DependencyKind,
        specials: &SpecialTokens,
    ) -> Result<Vec<Dependency>> {
        raw.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self::parse(module, token, kind, specials))
            .collect()
    }

    /// Parse a single dependency token
    pub fn parse(
        module: &str,
        token: &str,
        kind: DependencyKind,
        specials: &SpecialTokens,
    ) -> Result<Dependency> {
        let malformed = |reason: &str| ModgraphError::malformed_dependency(module, token, reason);

        let (head, compare) = match token.find(['>', '=']) {
            Some(idx) => {
                let value = token[idx + 1..].trim();
                if value.is_empty() {
                    return Err(malformed("missing version after comparison"));
                }
                if value.contains(['>', '=']) {
                    return Err(malformed("more than one version comparison"));
                }
                let compare = if token.as_bytes()[idx] == b'>' {
                    let spec = value
                        .parse::<SpecVersion>()
                        .map_err(|e| malformed(&e.to_string()))?;
                    VersionCompare::Minimum(spec)
                } else {
                    VersionCompare::Exact(value.to_string())
                };
                (token[..idx].trim(), Some(compare))
            }
            None => (token.trim(), None),
        };

        let (name, range) = match head.split_once('/') {
            Some((name, range)) => (name.trim(), Some(parse_range(range.trim()).map_err(malformed)?)),
            None => (head, None),
        };

        if name.is_empty() {
            return Err(malformed("missing code name"));
        }
        if name.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(malformed("code name contains whitespace or '/'"));
        }

        Ok(Dependency {
            special: specials.is_special(name),
            target: name.to_string(),
            kind,
            range,
            compare,
        })
    }
}

fn parse_range(raw: &str) -> std::result::Result<MajorRange, &'static str> {
    let number = |s: &str| s.trim().parse::<u32>().ok().and_then(|n| i32::try_from(n).ok());

    match raw.split_once('-') {
        Some((from, to)) => {
            let (Some(from), Some(to)) = (number(from), number(to)) else {
                return Err("major version range is not numeric");
            };
            if from > to {
                return Err("major version range is inverted");
            }
            Ok(MajorRange { from, to })
        }
        None => number(raw)
            .map(MajorRange::exact)
            .ok_or("major version is not numeric"),
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if let Some(range) = &self.range {
            write!(f, "/{}", range)?;
        }
        match &self.compare {
            Some(VersionCompare::Minimum(spec)) => write!(f, " > {}", spec),
            Some(VersionCompare::Exact(impl_version)) => write!(f, " = {}", impl_version),
            None => Ok(()),
        }
    }
}

/// Recognizer for platform and format marker tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokens {
    prefixes: Vec<String>,
    exact: Vec<String>,
}

impl SpecialTokens {
    /// Built-in markers plus additional prefixes
    pub fn with_extra_prefixes<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = Self::default();
        tokens.prefixes.extend(extra.into_iter().map(Into::into));
        tokens
    }

    pub fn is_special(&self, token: &str) -> bool {
        self.exact.iter().any(|t| t == token)
            || self.prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            prefixes: SPECIAL_PREFIXES.iter().map(|s| s.to_string()).collect(),
            exact: SPECIAL_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(token: &str) -> Result<Dependency> {
        Dependency::parse("test.module", token, DependencyKind::Direct, &SpecialTokens::default())
    }

    #[test]
    fn test_parse_bare_name() {
        let dep = parse("org.openide").unwrap();
        assert_eq!(dep.target, "org.openide");
        assert_eq!(dep.range, None);
        assert_eq!(dep.compare, None);
        assert!(!dep.special);
    }

    #[test]
    fn test_parse_range_and_spec() {
        let dep = parse("org.openidex/1-2 > 4.17").unwrap();
        assert_eq!(dep.target, "org.openidex");
        assert_eq!(dep.range, Some(MajorRange { from: 1, to: 2 }));
        assert_eq!(
            dep.compare,
            Some(VersionCompare::Minimum("4.17".parse().unwrap()))
        );
        assert_eq!(dep.to_string(), "org.openidex/1-2 > 4.17");
    }

    #[test]
    fn test_parse_implementation() {
        let dep = parse("my.module/3 = Ahoj").unwrap();
        assert_eq!(dep.range, Some(MajorRange::exact(3)));
        assert!(dep.is_implementation());
        assert_eq!(dep.to_string(), "my.module/3 = Ahoj");
    }

    #[rstest]
    #[case("")]
    #[case("/3")]
    #[case("a/x")]
    #[case("a/4-2")]
    #[case("a/1-")]
    #[case("a > ")]
    #[case("a > 1.x")]
    #[case("a = 1 > 2")]
    #[case("a b")]
    fn test_parse_malformed(#[case] token: &str) {
        assert!(matches!(
            parse(token),
            Err(ModgraphError::MalformedDependency { .. })
        ));
    }

    #[test]
    fn test_parse_list_skips_empty_tokens() {
        let deps = Dependency::parse_list(
            "m",
            "a/1, b > 1.0 ,, c",
            DependencyKind::Direct,
            &SpecialTokens::default(),
        )
        .unwrap();
        let names: Vec<&str> = deps.iter().map(|d| d.target.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_malformed_token_names_module() {
        let err = Dependency::parse_list("my.module", "ok, bad/x", DependencyKind::Direct, &SpecialTokens::default())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("my.module"));
        assert!(msg.contains("bad/x"));
    }

    #[rstest]
    #[case("org.openide.modules.os.MacOSX", true)]
    #[case("org.openide.modules.ModuleFormat1", true)]
    #[case("org.openide.modules.jre.JavaFX", true)]
    #[case("org.openide.modules", false)]
    #[case("my.token", false)]
    fn test_special_tokens(#[case] token: &str, #[case] special: bool) {
        assert_eq!(SpecialTokens::default().is_special(token), special);
    }

    #[test]
    fn test_extra_special_prefixes() {
        let specials = SpecialTokens::with_extra_prefixes(["com.example.marker."]);
        assert!(specials.is_special("com.example.marker.Linux"));
        assert!(specials.is_special("org.openide.modules.os.Unix"));
        assert!(!specials.is_special("com.example.other"));
    }

    #[test]
    fn test_major_range_contains() {
        let range = MajorRange { from: 2, to: 4 };
        assert!(range.contains(3));
        assert!(!range.contains(1));
        assert!(!range.contains(5));
    }
}
