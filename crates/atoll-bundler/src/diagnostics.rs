//! Compile diagnostics.
//!
//! Compilers report problems as plain, cloneable [`Diagnostic`] values so a
//! failed pass can be logged, rendered through miette at the CLI boundary and
//! pushed to the browser as a build-failed notification.

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Read,
    Parse,
    Transform,
    UnresolvedImport,
    Hydration,
    DuplicateIsland,
    Plugin,
    /// Reported by the browser bundler itself
    Bundle,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            help: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = Some(file.display().to_string());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }

    /// Map a syntax-tree error onto a compile diagnostic for `file`
    pub fn from_gen(file: &Path, error: atoll_gen::GenError) -> Self {
        let kind = match error {
            atoll_gen::GenError::TransformFailed { .. } => DiagnosticKind::Transform,
            _ => DiagnosticKind::Parse,
        };
        Self::error(kind, error.to_string()).with_file(file)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some(help) = &self.help {
            write!(f, " (help: {help})")?;
        }
        Ok(())
    }
}

/// A compile pass that produced at least one error diagnostic
#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error(
    "compilation failed with {} error(s)",
    .diagnostics.iter().filter(|d| d.is_error()).count()
)]
#[diagnostic(code(atoll::build::compile_failed))]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileFailure {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// One line per error, for logs and browser notifications
    pub fn summary(&self) -> String {
        self.errors()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_file_and_help() {
        let diagnostic = Diagnostic::error(DiagnosticKind::UnresolvedImport, "Cannot resolve ./x")
            .with_file(Path::new("app/pages/index.jsx"))
            .with_help("check the path");
        assert_eq!(
            diagnostic.to_string(),
            "app/pages/index.jsx: Cannot resolve ./x (help: check the path)"
        );
    }

    #[test]
    fn failure_counts_only_errors() {
        let failure = CompileFailure::new(vec![
            Diagnostic::warning(DiagnosticKind::UnresolvedImport, "bare import"),
            Diagnostic::error(DiagnosticKind::Parse, "unexpected token"),
        ]);
        assert_eq!(failure.to_string(), "compilation failed with 1 error(s)");
        assert_eq!(failure.summary(), "unexpected token");
    }
}
