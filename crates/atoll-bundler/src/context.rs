//! Build context: one server + browser build of a source tree.
//!
//! A [`BuildContext`] owns the output layout and the compile settings of
//! both targets for one generation. It builds into a staging directory next
//! to the live output; [`BuildContext::commit`] swaps the staged directories
//! into place, so a failed build never touches what is being served. The dev
//! coordinator creates a fresh context per restart.

use crate::compiler::{
    CompileOutput, CompileRequest, Compiler, LoadHook, OxcCompiler, RolldownCompiler,
    SCRIPT_EXTENSIONS, Target,
};
use crate::diagnostics::{CompileFailure, Diagnostic};
use crate::error::{BuildError, Result};
use crate::hydration::HydrationInjector;
use crate::island::{IslandCollector, IslandEntry};
use atoll_core::PluginRegistry;
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Directories under the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    /// Server pass output, tree preserved
    pub server: PathBuf,
    /// Generated client entry stubs
    pub generated: PathBuf,
    /// Browser pass output, served under `/public`
    pub client: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            server: root.join("server"),
            generated: root.join(".generated"),
            client: root.join(".client"),
            root,
        }
    }

    /// Where `generation` is built before it is committed
    pub fn staging(&self, generation: u64) -> Self {
        Self::new(self.root.join(format!(".staging-{generation}")))
    }

    /// Compiled pages, the input of route discovery
    pub fn pages_dir(&self) -> PathBuf {
        self.server.join("pages")
    }

    fn dirs(&self) -> [&Path; 3] {
        [
            self.server.as_path(),
            self.generated.as_path(),
            self.client.as_path(),
        ]
    }
}

/// Compilers of the two passes
#[derive(Clone)]
pub struct Toolchain {
    pub server: Arc<dyn Compiler>,
    pub browser: Arc<dyn Compiler>,
}

impl Toolchain {
    /// Per-module OXC transpiling on the server, rolldown bundles in the
    /// browser, both lowering JSX through `jsx_import_source`
    pub fn new(jsx_import_source: &str) -> Self {
        Self {
            server: Arc::new(OxcCompiler::new(jsx_import_source)),
            browser: Arc::new(RolldownCompiler::new(jsx_import_source)),
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("preact")
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("server", &self.server.name())
            .field("browser", &self.browser.name())
            .finish()
    }
}

/// Inputs of a build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Module exporting `h` and `hydrate` for island bootstraps
    pub hydration_runtime: String,
}

impl BuildOptions {
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
            hydration_runtime: "preact".to_string(),
        }
    }
}

/// Compile settings of one target
#[derive(Debug, Clone)]
pub struct TargetContext {
    template: CompileRequest,
}

impl TargetContext {
    pub fn target(&self) -> Target {
        self.template.target
    }

    pub fn out_dir(&self) -> &Path {
        &self.template.out_dir
    }

    pub fn request(&self, entries: Vec<PathBuf>) -> CompileRequest {
        self.template.clone().entries(entries)
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub generation: u64,
    pub server_modules: usize,
    pub client_modules: usize,
    pub islands: Vec<IslandEntry>,
    pub warnings: Vec<Diagnostic>,
    pub duration: Duration,
}

pub struct BuildContext {
    layout: OutputLayout,
    staging: OutputLayout,
    src_dir: PathBuf,
    server: TargetContext,
    browser: TargetContext,
    generation: u64,
    toolchain: Toolchain,
    hooks: Vec<Arc<dyn LoadHook>>,
    committed: AtomicBool,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("generation", &self.generation)
            .field("src_dir", &self.src_dir)
            .field("layout", &self.layout)
            .field("toolchain", &self.toolchain)
            .field("committed", &self.is_committed())
            .finish()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf().clean());
    }
    let cwd = std::env::current_dir().map_err(|e| BuildError::io(path, e))?;
    Ok(cwd.join(path).clean())
}

impl BuildContext {
    /// Create the context for `generation` with an empty staging directory.
    ///
    /// The live output of earlier generations is left alone.
    pub async fn create(
        options: BuildOptions,
        toolchain: Toolchain,
        plugins: Arc<PluginRegistry>,
        generation: u64,
    ) -> Result<Self> {
        let src_dir = absolute(&options.src_dir)?;
        if !src_dir.is_dir() {
            return Err(BuildError::MissingSource { dir: src_dir });
        }
        let layout = OutputLayout::new(absolute(&options.out_dir)?);
        let staging = layout.staging(generation);

        if staging.root.exists() {
            tokio::fs::remove_dir_all(&staging.root)
                .await
                .map_err(|e| BuildError::io(&staging.root, e))?;
        }
        for dir in staging.dirs() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BuildError::io(dir, e))?;
        }

        let server = TargetContext {
            template: CompileRequest::new(Target::Server, &src_dir, &staging.server),
        };
        let browser = TargetContext {
            template: CompileRequest::new(Target::Browser, &src_dir, &staging.client),
        };

        let hooks: Vec<Arc<dyn LoadHook>> = vec![Arc::new(HydrationInjector::new(
            options.hydration_runtime.clone(),
            plugins,
        ))];

        tracing::debug!(generation, staging = %staging.root.display(), "build context created");

        Ok(Self {
            layout,
            staging,
            src_dir,
            server,
            browser,
            generation,
            toolchain,
            hooks,
            committed: AtomicBool::new(false),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The live output, replaced on [`commit`](Self::commit)
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Where this generation is built
    pub fn staging(&self) -> &OutputLayout {
        &self.staging
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    pub fn target(&self, target: Target) -> &TargetContext {
        match target {
            Target::Server => &self.server,
            Target::Browser => &self.browser,
        }
    }

    /// Every compilable file under the source root, in sorted walk order.
    ///
    /// The output root and `node_modules` are never part of the sources.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.src_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !e.path().starts_with(&self.layout.root) && e.file_name() != "node_modules"
            });
        for entry in walker {
            let entry = entry.map_err(|source| BuildError::Scan {
                dir: self.src_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let is_script = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e));
            if entry.file_type().is_file() && is_script {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    async fn run(
        &self,
        target: Target,
        entries: Vec<PathBuf>,
        hooks: &[Arc<dyn LoadHook>],
    ) -> Result<CompileOutput> {
        let request = self.target(target).request(entries);
        let compiler = match target {
            Target::Server => &self.toolchain.server,
            Target::Browser => &self.toolchain.browser,
        };
        compiler
            .compile(&request, hooks)
            .await
            .map_err(|failure| BuildError::Compile { target, failure })
    }

    /// Server pass, island collection, then browser pass, all into staging.
    pub async fn build(&self) -> Result<BuildReport> {
        let started = Instant::now();
        let sources = self.source_files()?;

        let server = self.run(Target::Server, sources.clone(), &[]).await?;

        let islands = IslandCollector::new(&self.staging.generated)
            .collect(&sources)
            .await
            .map_err(|diagnostics| BuildError::Compile {
                target: Target::Browser,
                failure: CompileFailure::new(diagnostics),
            })?;

        let stubs = islands.iter().map(|i| i.stub.clone()).collect();
        let client = if islands.is_empty() {
            CompileOutput::default()
        } else {
            self.run(Target::Browser, stubs, &self.hooks).await?
        };

        let mut warnings = server.warnings;
        warnings.extend(client.warnings);

        let report = BuildReport {
            generation: self.generation,
            server_modules: server.modules.len(),
            client_modules: client.modules.len(),
            islands,
            warnings,
            duration: started.elapsed(),
        };

        tracing::info!(
            generation = report.generation,
            server_modules = report.server_modules,
            client_modules = report.client_modules,
            islands = report.islands.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "build finished"
        );
        Ok(report)
    }

    /// Swap the staged output into the live layout.
    ///
    /// Each live directory is moved aside before its replacement is renamed
    /// in, then the staging root (holding the retired directories) is
    /// removed.
    pub async fn commit(&self) -> Result<()> {
        let retired = self.staging.root.join("retired");
        tokio::fs::create_dir_all(&retired)
            .await
            .map_err(|e| BuildError::io(&retired, e))?;

        for (staged, live) in self.staging.dirs().into_iter().zip(self.layout.dirs()) {
            if live.exists() {
                let aside = retired.join(live.file_name().unwrap_or_default());
                tokio::fs::rename(live, &aside)
                    .await
                    .map_err(|e| BuildError::io(live, e))?;
            }
            tokio::fs::rename(staged, live)
                .await
                .map_err(|e| BuildError::io(staged, e))?;
        }

        self.committed.store(true, Ordering::Release);
        tokio::fs::remove_dir_all(&self.staging.root)
            .await
            .map_err(|e| BuildError::io(&self.staging.root, e))?;

        tracing::debug!(generation = self.generation, out = %self.layout.root.display(), "build committed");
        Ok(())
    }

    /// Release the context. Uncommitted staging output is deleted; live
    /// output stays on disk.
    pub fn dispose(self) {
        if !self.is_committed() && self.staging.root.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.staging.root) {
                tracing::debug!(
                    staging = %self.staging.root.display(),
                    error = %e,
                    "could not remove staging output"
                );
            }
        }
        tracing::debug!(generation = self.generation, "build context disposed");
    }
}
