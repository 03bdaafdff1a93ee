//! Error types for parsing and printing JavaScript modules

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while turning source text into a syntax tree and back
#[derive(Error, Debug, Diagnostic)]
pub enum GenError {
    /// The source could not be parsed
    #[error("Failed to parse {path}: {}", messages.join(", "))]
    #[diagnostic(code(atoll::gen::parse_failed))]
    ParseFailed { path: String, messages: Vec<String> },

    /// A snippet injected into an existing tree did not parse
    #[error("Invalid snippet: {reason}")]
    #[diagnostic(code(atoll::gen::invalid_snippet))]
    InvalidSnippet { reason: String },

    /// The JSX/TypeScript lowering pass reported errors
    #[error("Transform failed for {path}: {}", messages.join(", "))]
    #[diagnostic(code(atoll::gen::transform_failed))]
    TransformFailed { path: String, messages: Vec<String> },

    /// The file extension does not map to a JavaScript dialect
    #[error("Unsupported source type: {path}")]
    #[diagnostic(code(atoll::gen::unsupported_source))]
    UnsupportedSource { path: String },
}

impl GenError {
    /// Create a ParseFailed error
    pub fn parse_failed(path: impl Into<String>, messages: Vec<String>) -> Self {
        Self::ParseFailed {
            path: path.into(),
            messages,
        }
    }

    /// Create an InvalidSnippet error
    pub fn invalid_snippet(reason: impl Into<String>) -> Self {
        Self::InvalidSnippet {
            reason: reason.into(),
        }
    }
}

/// Result type for syntax tree operations
pub type Result<T> = std::result::Result<T, GenError>;
