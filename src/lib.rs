//! # ripple - Change Impact Analysis
//!
//! Understand what a single-file edit semantically changed, what else in
//! the repository it might affect, and how risky it is to commit.
//!
//! ## Features
//!
//! - **Baseline resolution**: an ordered fallback chain — merge-base (pr
//!   mode), VCS HEAD, session snapshot, disk seed — that always says *why*
//!   it fell back
//! - **Semantic diff**: AST-level declaration diffing with normalized
//!   signatures, so formatting noise and body-only edits never count as
//!   contract changes
//! - **Downstream discovery**: conservative textual scan for files that
//!   import the edited file or reference its changed symbols
//! - **Confidence scoring**: six weighted heuristic metrics folded into a
//!   single 0-100 score and status band
//! - **Injected collaborators**: VCS, filesystem and diagnostics are
//!   traits passed in at construction — no editor or runtime coupling
//!
//! ## Quick Start
//!
//! ```no_run
//! use ripple::{Config, ImpactEngine, SourceVersion};
//!
//! # fn main() -> anyhow::Result<()> {
//! let engine = ImpactEngine::with_defaults("/path/to/repo", Config::default());
//!
//! // Analyze an unsaved buffer against its resolved baseline
//! let path = std::path::Path::new("/path/to/repo/src/math.ts");
//! let current = SourceVersion::buffer(std::fs::read_to_string(path)?);
//! let analysis = engine.analyze(path, &current);
//!
//! println!(
//!     "changed: {:?}, confidence: {} ({:?})",
//!     analysis.changes.functions, analysis.confidence.total, analysis.confidence.status,
//! );
//! # Ok(())
//! # }
//! ```

pub mod baseline;
pub mod changes;
pub mod confidence;
pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod discovery;
pub mod downstream;
pub mod engine;
pub mod fsys;
pub mod inventory;
pub mod language;
pub mod vcs;

pub use baseline::{Availability, BaselineOutcome, BaselineResolution, BaselineResolver, RefType};
pub use changes::{changed_region, ChangedRegion};
pub use confidence::{ConfidenceResult, MetricName, MetricResult, ScoreInput, Status};
pub use config::{BaselineMode, Config};
pub use diagnostics::{Diagnostic, DiagnosticsProvider, Severity, StaticDiagnostics};
pub use diff::{semantic_diff, ChangeSet};
pub use discovery::discover_tests;
pub use downstream::{scan_downstream, DownstreamScan};
pub use engine::{
    Analysis, ImpactEngine, ImpactReport, ReportIssue, ReportIssueKind, SourceVersion, TextOrigin,
};
pub use fsys::{Filesystem, OsFilesystem};
pub use inventory::{Declaration, Inventory, ParseStatus, StructuralInventory};
pub use language::Language;
pub use vcs::{GitCli, NoVcs, VcsClient};
