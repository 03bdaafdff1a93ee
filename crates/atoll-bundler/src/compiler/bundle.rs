//! Browser bundles built with rolldown.
//!
//! Every entry is bundled on its own, so each client entry comes out as one
//! self-contained script: local modules and the packages they import from
//! `node_modules` are inlined and nothing is left for the browser to
//! resolve. Local sources go through [`SourceLoader`], which applies the
//! load hooks and lowers JSX/TypeScript before rolldown links them.

use super::resolve::is_script;
use super::{
    CompileFailure, CompileOutput, CompileRequest, Compiler, EmittedModule, LoadHook, OxcCompiler,
    apply_hooks, write_error,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use rolldown::{BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform, ResolveOptions};
use rolldown_common::{ModuleType, Output};
use rolldown_plugin::__inner::SharedPluginable;
use rolldown_plugin::{HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RolldownCompiler {
    lowering: OxcCompiler,
}

impl RolldownCompiler {
    /// Bundler lowering JSX through `<jsx_import_source>/jsx-runtime`
    pub fn new(jsx_import_source: impl Into<String>) -> Self {
        Self {
            lowering: OxcCompiler::new(jsx_import_source),
        }
    }

    async fn bundle_entry(
        &self,
        request: &CompileRequest,
        entry: &Path,
        hooks: &[Arc<dyn LoadHook>],
    ) -> Result<CompileOutput, Vec<Diagnostic>> {
        let loader = Arc::new(LoaderState {
            lowering: self.lowering.clone(),
            hooks: hooks.to_vec(),
            errors: Mutex::new(Vec::new()),
        });
        let plugin: SharedPluginable = Arc::new(SourceLoader {
            state: Arc::clone(&loader),
        });

        let name = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entry".to_string());

        let options = BundlerOptions {
            input: Some(vec![InputItem {
                name: Some(name),
                import: entry.to_string_lossy().into_owned(),
            }]),
            cwd: Some(request.base_dir.clone()),
            format: Some(OutputFormat::Esm),
            platform: Some(Platform::Browser),
            external: Some(IsExternal::from(Vec::<String>::new())),
            resolve: Some(resolve_options(&request.base_dir)),
            ..Default::default()
        };

        let failed = |error: &dyn std::fmt::Debug| {
            let captured = std::mem::take(&mut *loader.errors.lock());
            if captured.is_empty() {
                vec![
                    Diagnostic::error(DiagnosticKind::Bundle, format!("{error:?}")).with_file(entry),
                ]
            } else {
                captured
            }
        };

        let mut bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(vec![plugin])
            .build()
            .map_err(|e| failed(&e))?;
        let bundle = bundler.generate().await.map_err(|e| failed(&e))?;

        let mut output = CompileOutput::default();
        let mut errors = Vec::new();
        for item in &bundle.assets {
            let (filename, contents, is_entry) = match item {
                Output::Chunk(chunk) => (chunk.filename.as_str(), chunk.code.as_bytes(), chunk.is_entry),
                Output::Asset(asset) => (asset.filename.as_str(), asset.source.as_bytes(), false),
            };
            let target = request.out_dir.join(filename);
            if let Some(parent) = target.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    errors.push(write_error(parent, &e));
                    continue;
                }
            }
            if let Err(e) = tokio::fs::write(&target, contents).await {
                errors.push(write_error(&target, &e));
                continue;
            }
            tracing::trace!(
                pass = %request.target,
                entry = %entry.display(),
                output = %target.display(),
                "emitted bundle file"
            );
            output.modules.push(EmittedModule {
                source: entry.to_path_buf(),
                output: target,
                entry: is_entry,
            });
        }

        output.warnings.extend(bundle.warnings.iter().map(|warning| {
            Diagnostic::warning(DiagnosticKind::Bundle, format!("{warning:?}")).with_file(entry)
        }));

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

#[async_trait]
impl Compiler for RolldownCompiler {
    fn name(&self) -> &str {
        "rolldown"
    }

    async fn compile(
        &self,
        request: &CompileRequest,
        hooks: &[Arc<dyn LoadHook>],
    ) -> Result<CompileOutput, CompileFailure> {
        let mut output = CompileOutput::default();
        let mut errors = Vec::new();

        // Isolated builds: no chunk is shared between two entries.
        for entry in &request.entries {
            let entry = request.absolute(entry);
            match self.bundle_entry(request, &entry, hooks).await {
                Ok(bundled) => {
                    output.modules.extend(bundled.modules);
                    output.warnings.extend(bundled.warnings);
                }
                Err(diagnostics) => errors.extend(diagnostics),
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(CompileFailure::new(errors))
        }
    }
}

/// Module resolution for the browser: `node_modules` from the source root
/// upwards, browser conditions first.
fn resolve_options(base_dir: &Path) -> ResolveOptions {
    let modules = base_dir
        .ancestors()
        .map(|dir| dir.join("node_modules").to_string_lossy().into_owned())
        .chain(std::iter::once("node_modules".to_string()))
        .collect();

    ResolveOptions {
        main_fields: Some(vec![
            "browser".to_string(),
            "module".to_string(),
            "main".to_string(),
        ]),
        condition_names: Some(vec![
            "browser".to_string(),
            "import".to_string(),
            "module".to_string(),
            "default".to_string(),
        ]),
        extensions: Some(vec![
            ".js".to_string(),
            ".jsx".to_string(),
            ".ts".to_string(),
            ".tsx".to_string(),
            ".mjs".to_string(),
            ".json".to_string(),
        ]),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

/// Shared between the plugin and the compile call that reads back the
/// diagnostics of a failed load.
struct LoaderState {
    lowering: OxcCompiler,
    hooks: Vec<Arc<dyn LoadHook>>,
    errors: Mutex<Vec<Diagnostic>>,
}

impl LoaderState {
    fn fail(&self, diagnostic: Diagnostic) -> anyhow::Error {
        let error = anyhow!("{diagnostic}");
        self.errors.lock().push(diagnostic);
        error
    }

    async fn load(&self, path: &Path) -> Result<String, anyhow::Error> {
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            self.fail(
                Diagnostic::error(DiagnosticKind::Read, format!("Failed to read module: {e}"))
                    .with_file(path),
            )
        })?;
        let source = apply_hooks(path, source, &self.hooks).map_err(|d| self.fail(d))?;
        self.lowering.lower(path, &source).map_err(|d| self.fail(d))
    }
}

/// Whether the loader handles `path` itself; packages are left to rolldown.
fn is_local_source(path: &Path) -> bool {
    path.is_absolute()
        && is_script(path)
        && !path
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

/// Rolldown plugin serving local sources through the load hooks
struct SourceLoader {
    state: Arc<LoaderState>,
}

impl std::fmt::Debug for SourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLoader")
            .field("hooks", &self.state.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Plugin for SourceLoader {
    fn name(&self) -> Cow<'static, str> {
        "atoll-source-loader".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = PathBuf::from(args.id.to_string());
        let state = Arc::clone(&self.state);

        async move {
            if !is_local_source(&id) {
                return Ok(None);
            }
            let code = state.load(&id).await?;
            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packages_are_left_to_the_bundler() {
        assert!(is_local_source(Path::new("/site/app/components/counter.island.jsx")));
        assert!(is_local_source(Path::new("/site/.atoll/.generated/counter.client.js")));
        assert!(!is_local_source(Path::new("/site/node_modules/preact/dist/preact.mjs")));
        assert!(!is_local_source(Path::new("/site/app/styles.css")));
        assert!(!is_local_source(Path::new("relative/module.js")));
    }

    #[test]
    fn package_lookup_walks_up_from_the_source_root() {
        let options = resolve_options(Path::new("/site/app"));
        let modules = options.modules.unwrap();
        assert_eq!(modules[0], "/site/app/node_modules");
        assert_eq!(modules[1], "/site/node_modules");
        assert_eq!(modules.last().map(String::as_str), Some("node_modules"));
    }
}
