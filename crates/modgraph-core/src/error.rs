//! Engine error types

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModgraphError>;

/// Fatal errors. Any of these aborts the current run.
#[derive(Debug, Error)]
pub enum ModgraphError {
    #[error("Duplicate module '{code_base}' declared by {first} and {second}")]
    DuplicateModule {
        code_base: String,
        first: String,
        second: String,
    },

    #[error("Malformed code name '{code_name}' in {origin}: {reason}")]
    MalformedCodeName {
        code_name: String,
        origin: String,
        reason: String,
    },

    #[error("Malformed dependency '{token}' in module {module}: {reason}")]
    MalformedDependency {
        module: String,
        token: String,
        reason: String,
    },

    #[error("Malformed public package '{entry}' in module {module}: expected 'pkg.*' or 'pkg.**'")]
    MalformedPattern { module: String, entry: String },

    #[error("Malformed specification version '{version}' in module {module}")]
    MalformedVersion { module: String, version: String },

    #[error("Public package {pattern} declared by {module} but not found")]
    UndeclaredPackage { module: String, pattern: String },

    #[error(
        "Unsatisfied dependency '{dependency}'{}",
        .referrer.as_deref().map(|r| format!(" required by {}", r)).unwrap_or_default()
    )]
    Unsatisfied {
        dependency: String,
        referrer: Option<String>,
    },

    #[error("Unknown report type '{0}'")]
    UnknownReport(String),

    #[error("Unsupported scan file format: {}", .0.display())]
    UnsupportedScanFormat(PathBuf),

    #[error("I/O error at {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid TOML in {}: {error}", .path.display())]
    Toml {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid JSON in {}: {error}", .path.display())]
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
}

impl ModgraphError {
    /// Create an unsatisfied dependency error
    pub fn unsatisfied(dependency: impl ToString, referrer: Option<&str>) -> Self {
        Self::Unsatisfied {
            dependency: dependency.to_string(),
            referrer: referrer.map(str::to_string),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create a malformed dependency error
    pub fn malformed_dependency(
        module: impl Into<String>,
        token: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::MalformedDependency {
            module: module.into(),
            token: token.into(),
            reason: reason.to_string(),
        }
    }
}
