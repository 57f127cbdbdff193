//! CLI configuration via environment variables
//!
//! Settings that affect the terminal rather than the analysis live here;
//! analysis settings come from modgraph.toml through `modgraph_config`.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON output (MODGRAPH_JSON=1)
    pub default_json: bool,
    /// Disable colored output (MODGRAPH_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("MODGRAPH_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var("MODGRAPH_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
