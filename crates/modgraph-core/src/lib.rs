//! Modgraph core
//!
//! Module dependency graph engine: loads scanned module facts into a
//! [`Registry`], resolves dependencies, classifies exported packages and
//! runs the graph analyses behind every [`ReportKind`].
//!
//! ```no_run
//! use modgraph_core::{AnalysisOptions, Analyzer, RegistryLoader, ReportKind, ScanCache};
//! use std::path::Path;
//!
//! # fn main() -> modgraph_core::Result<()> {
//! let mut cache = ScanCache::new();
//! let mut loader = RegistryLoader::new();
//! loader.add_scan(&*cache.load(Path::new("platform.toml"))?)?;
//! let registry = loader.load()?;
//!
//! let options = AnalysisOptions::default();
//! let outcome = Analyzer::new(&registry, &options).run(ReportKind::Kits)?;
//! print!("{}", outcome.report);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod closure;
pub mod dependency;
pub mod diagnostics;
pub mod error;
pub mod module;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod version;

pub use classifier::{classify, validate};
pub use closure::transitive_closure;
pub use dependency::{Dependency, DependencyKind, MajorRange, SpecialTokens, VersionCompare};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ModgraphError, Result};
pub use module::{Module, PackagePattern};
pub use registry::{Registry, RegistryLoader};
pub use report::{
    AnalysisOptions, Analyzer, ClusterPolicy, ModuleRef, Outcome, Report, ReportKind,
};
pub use resolver::Resolver;
pub use scan::{Fingerprint, LibraryFacts, ModuleFacts, ScanCache, ScanFile};
pub use version::SpecVersion;
