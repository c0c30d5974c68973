//! Diagnostics input model
//!
//! Diagnostics come from an external static-analysis or compiler
//! integration; the scorer treats them purely as input data and never
//! produces them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic, ordered most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A single diagnostic reported against the analyzed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line the diagnostic is anchored to
    pub line: u32,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Convenience constructor
    pub fn new(line: u32, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            line,
            severity,
            message: message.into(),
        }
    }
}

/// Per-file diagnostics supplier, injected into the engine
pub trait DiagnosticsProvider: Send + Sync {
    /// Diagnostics currently known for the file
    fn diagnostics_for(&self, path: &Path) -> Vec<Diagnostic>;
}

/// Map-backed provider for hosts that push diagnostics ahead of analysis
#[derive(Debug, Default)]
pub struct StaticDiagnostics {
    by_file: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl StaticDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics recorded for a file
    pub fn set(&mut self, path: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) {
        self.by_file.insert(path.into(), diagnostics);
    }
}

impl DiagnosticsProvider for StaticDiagnostics {
    fn diagnostics_for(&self, path: &Path) -> Vec<Diagnostic> {
        self.by_file.get(path).cloned().unwrap_or_default()
    }
}
