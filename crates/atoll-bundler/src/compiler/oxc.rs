//! Per-module transpiling compiler built on OXC.
//!
//! Each module is parsed, has JSX/TypeScript lowered, gets its local import
//! specifiers pointed at the emitted files, and is printed to the output
//! directory with the source tree preserved. Bare specifiers are left as
//! they are.

use super::resolve::{relative_specifier, resolve_local};
use super::{
    CompileFailure, CompileOutput, CompileRequest, Compiler, EmittedModule, LoadHook, apply_hooks,
    write_error,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use async_trait::async_trait;
use atoll_gen::{Allocator, SyntaxTree};
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct OxcCompiler {
    jsx_import_source: String,
}

impl Default for OxcCompiler {
    fn default() -> Self {
        Self::new("preact")
    }
}

impl OxcCompiler {
    /// Compiler emitting JSX through `<jsx_import_source>/jsx-runtime`
    pub fn new(jsx_import_source: impl Into<String>) -> Self {
        Self {
            jsx_import_source: jsx_import_source.into(),
        }
    }

    pub fn jsx_import_source(&self) -> &str {
        &self.jsx_import_source
    }

    fn with_pragma(&self, source: &str) -> String {
        if source.contains("@jsxImportSource") {
            source.to_string()
        } else {
            format!("/** @jsxImportSource {} */\n{source}", self.jsx_import_source)
        }
    }

    /// Lower TypeScript and JSX in `source` to plain JavaScript.
    ///
    /// Import specifiers are kept as written.
    pub fn lower(&self, path: &Path, source: &str) -> Result<String, Diagnostic> {
        let allocator = Allocator::default();
        let text = allocator.alloc_str(&self.with_pragma(source));
        let mut tree =
            SyntaxTree::parse(&allocator, text, path).map_err(|e| Diagnostic::from_gen(path, e))?;
        tree.transpile().map_err(|e| Diagnostic::from_gen(path, e))?;
        Ok(tree.print())
    }

    /// Lower one module and point its local imports at their emitted files.
    fn transpile(
        &self,
        request: &CompileRequest,
        path: &Path,
        output: &Path,
        source: &str,
    ) -> Result<String, Vec<Diagnostic>> {
        let allocator = Allocator::default();
        let text = allocator.alloc_str(&self.with_pragma(source));

        let mut tree =
            SyntaxTree::parse(&allocator, text, path).map_err(|e| vec![Diagnostic::from_gen(path, e)])?;
        tree.transpile()
            .map_err(|e| vec![Diagnostic::from_gen(path, e)])?;

        let mut errors = Vec::new();
        let mut rewrites: FxHashMap<String, String> = FxHashMap::default();
        let out_parent = output.parent().unwrap_or_else(|| Path::new(""));

        for specifier in tree.module_specifiers() {
            if !specifier.is_local() {
                continue;
            }
            let Some(resolved) = resolve_local(path, &specifier.value) else {
                errors.push(
                    Diagnostic::error(
                        DiagnosticKind::UnresolvedImport,
                        format!("Cannot resolve import \"{}\"", specifier.value),
                    )
                    .with_file(path),
                );
                continue;
            };
            match self.output_path(request, &resolved) {
                Ok(target) => {
                    rewrites.insert(
                        specifier.value.clone(),
                        relative_specifier(out_parent, &target),
                    );
                }
                Err(diagnostic) => errors.push(diagnostic.with_file(path)),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        tree.rewrite_specifiers(|specifier| rewrites.get(&specifier.value).cloned());
        Ok(tree.print())
    }

    /// `<out>/<path relative to base_dir>.js`
    fn output_path(&self, request: &CompileRequest, source: &Path) -> Result<PathBuf, Diagnostic> {
        let relative = source
            .strip_prefix(request.base_dir.clean())
            .map_err(|_| {
                Diagnostic::error(
                    DiagnosticKind::UnresolvedImport,
                    format!(
                        "{} is outside the source root {}",
                        source.display(),
                        request.base_dir.display()
                    ),
                )
            })?;
        Ok(request.out_dir.join(relative.with_extension("js")))
    }
}

#[async_trait]
impl Compiler for OxcCompiler {
    fn name(&self) -> &str {
        "oxc"
    }

    async fn compile(
        &self,
        request: &CompileRequest,
        hooks: &[Arc<dyn LoadHook>],
    ) -> Result<CompileOutput, CompileFailure> {
        let mut output = CompileOutput::default();
        let mut errors = Vec::new();

        for entry in &request.entries {
            let path = request.absolute(entry);

            let source = match tokio::fs::read_to_string(&path).await {
                Ok(source) => source,
                Err(e) => {
                    errors.push(
                        Diagnostic::error(DiagnosticKind::Read, format!("Failed to read module: {e}"))
                            .with_file(&path),
                    );
                    continue;
                }
            };

            let source = match apply_hooks(&path, source, hooks) {
                Ok(source) => source,
                Err(diagnostic) => {
                    errors.push(diagnostic);
                    continue;
                }
            };

            let target = match self.output_path(request, &path) {
                Ok(target) => target,
                Err(diagnostic) => {
                    errors.push(diagnostic.with_file(&path));
                    continue;
                }
            };

            let code = match self.transpile(request, &path, &target, &source) {
                Ok(code) => code,
                Err(diagnostics) => {
                    errors.extend(diagnostics);
                    continue;
                }
            };

            if let Some(parent) = target.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    errors.push(write_error(parent, &e));
                    continue;
                }
            }
            if let Err(e) = tokio::fs::write(&target, code).await {
                errors.push(write_error(&target, &e));
                continue;
            }

            tracing::trace!(
                pass = %request.target,
                source = %path.display(),
                output = %target.display(),
                "emitted module"
            );

            output.modules.push(EmittedModule {
                source: path,
                output: target,
                entry: true,
            });
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(CompileFailure::new(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering_strips_types_and_jsx() {
        let compiler = OxcCompiler::default();
        let code = compiler
            .lower(
                Path::new("app/components/badge.tsx"),
                "export const Badge = ({ n }: { n: number }) => <b>{n}</b>;\n",
            )
            .unwrap();
        assert!(code.contains("preact/jsx-runtime"), "{code}");
        assert!(!code.contains(": number"), "{code}");
        assert!(!code.contains("<b>"), "{code}");
    }

    #[test]
    fn lowering_reports_syntax_errors_with_the_file() {
        let err = OxcCompiler::default()
            .lower(Path::new("app/broken.jsx"), "export default function ( {")
            .unwrap_err();
        assert!(err.is_error());
        assert_eq!(err.file.as_deref(), Some("app/broken.jsx"));
    }
}
