//! Build errors

use crate::compiler::{CompileFailure, Target};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum BuildError {
    /// Preparing or scanning a build directory failed
    #[error("I/O error at {}: {source}", path.display())]
    #[diagnostic(code(atoll::build::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scanning the source tree failed
    #[error("Failed to scan {}: {source}", dir.display())]
    #[diagnostic(code(atoll::build::scan))]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The source directory is missing
    #[error("Source directory not found: {}", dir.display())]
    #[diagnostic(
        code(atoll::build::missing_source),
        help("Create it or point `src_dir` in atoll.toml at your pages")
    )]
    MissingSource { dir: PathBuf },

    /// A compile pass failed
    #[error("{target} build failed: {}", failure.summary())]
    #[diagnostic(code(atoll::build::compile_failed))]
    Compile {
        target: Target,
        #[source]
        failure: CompileFailure,
    },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Compile diagnostics, if this is a compile failure
    pub fn compile_failure(&self) -> Option<&CompileFailure> {
        match self {
            Self::Compile { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
