//! Compiler contract
//!
//! atoll describes what it wants compiled in a [`CompileRequest`] and hands
//! it to a [`Compiler`]. Source rewrites that must happen before compilation
//! (hydration injection) are expressed as [`LoadHook`]s the compiler applies
//! when it reads a module.
//!
//! Two compilers ship with the crate: [`OxcCompiler`] transpiles module by
//! module with the tree preserved (server pass), [`RolldownCompiler`] bundles
//! every entry into one self-contained browser script (browser pass).

mod bundle;
mod oxc;
mod resolve;

pub use bundle::RolldownCompiler;
pub use oxc::OxcCompiler;
pub use resolve::{SCRIPT_EXTENSIONS, relative_specifier, resolve_local};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use async_trait::async_trait;
use path_clean::PathClean;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::diagnostics::CompileFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Server,
    Browser,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Server => "server",
            Self::Browser => "browser",
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Modules to compile; relative entries are resolved against `base_dir`
    pub entries: Vec<PathBuf>,
    /// Source root; output paths are computed relative to it and packages
    /// are looked up in `node_modules` directories from here upwards
    pub base_dir: PathBuf,
    pub out_dir: PathBuf,
    pub target: Target,
}

impl CompileRequest {
    pub fn new(target: Target, base_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            base_dir: base_dir.into(),
            out_dir: out_dir.into(),
            target,
        }
    }

    pub fn entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.entries = entries;
        self
    }

    /// `path` made absolute against the source root
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.base_dir.join(path).clean()
        }
    }
}

/// One compiled module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedModule {
    pub source: PathBuf,
    pub output: PathBuf,
    pub entry: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub modules: Vec<EmittedModule>,
    pub warnings: Vec<Diagnostic>,
}

/// Source rewrite applied while a compiler reads a module
pub trait LoadHook: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this hook rewrites the module at `path`
    fn applies_to(&self, path: &Path, source: &str) -> bool;

    fn load(&self, path: &Path, source: &str) -> Result<String, Diagnostic>;
}

/// Run every applicable hook in order; untouched sources come back as-is.
pub fn apply_hooks(
    path: &Path,
    source: String,
    hooks: &[Arc<dyn LoadHook>],
) -> Result<String, Diagnostic> {
    let mut source = source;
    for hook in hooks {
        if hook.applies_to(path, &source) {
            tracing::trace!(hook = hook.name(), path = %path.display(), "applying load hook");
            source = hook.load(path, &source)?;
        }
    }
    Ok(source)
}

#[async_trait]
pub trait Compiler: Send + Sync {
    fn name(&self) -> &str;

    /// Compile the request, writing output files.
    ///
    /// Fails with every error diagnostic of the pass; warnings of a
    /// successful pass are returned in the output.
    async fn compile(
        &self,
        request: &CompileRequest,
        hooks: &[Arc<dyn LoadHook>],
    ) -> Result<CompileOutput, CompileFailure>;
}

pub(crate) fn write_error(path: &Path, error: &std::io::Error) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::Write,
        format!("Failed to write {}: {error}", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl LoadHook for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn applies_to(&self, path: &Path, _source: &str) -> bool {
            path.extension().is_some_and(|e| e == "txt")
        }

        fn load(&self, _path: &Path, source: &str) -> Result<String, Diagnostic> {
            Ok(source.to_uppercase())
        }
    }

    #[test]
    fn hooks_only_touch_matching_files() {
        let hooks: Vec<Arc<dyn LoadHook>> = vec![Arc::new(Upper)];
        let source = "export const a = 'x';".to_string();

        let untouched = apply_hooks(Path::new("a.js"), source.clone(), &hooks).unwrap();
        assert_eq!(untouched, source);

        let rewritten = apply_hooks(Path::new("a.txt"), source, &hooks).unwrap();
        assert_eq!(rewritten, "EXPORT CONST A = 'X';");
    }
}
