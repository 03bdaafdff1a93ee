//! A loaded atoll project: config plus the app's pages and plugins.

use crate::config::AtollConfig;
use crate::error::Result;
use crate::ui;
use atoll_bundler::{BuildContext, BuildOptions, BuildReport, Toolchain};
use atoll_core::{
    PageRegistry, PluginRegistry, RenderComposer, RouteDescriptor, RouteTable, RouteTableBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output of one successful, committed build plus the routes discovered
/// in it
#[derive(Debug)]
pub struct Prepared {
    pub ctx: BuildContext,
    pub report: BuildReport,
    pub table: RouteTable,
}

impl Prepared {
    /// Page file of `route`, relative to the compiled pages directory
    pub fn page_file<'a>(&self, route: &'a RouteDescriptor) -> &'a Path {
        route
            .source_path
            .strip_prefix(self.ctx.staging().pages_dir())
            .unwrap_or(&route.source_path)
    }
}

pub struct Project {
    root: PathBuf,
    config: AtollConfig,
    pages: Arc<PageRegistry>,
    plugins: Arc<PluginRegistry>,
    toolchain: Toolchain,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("pages", &self.pages)
            .field("plugins", &self.plugins)
            .field("toolchain", &self.toolchain)
            .finish()
    }
}

impl Project {
    pub fn new(
        root: impl Into<PathBuf>,
        config: AtollConfig,
        pages: PageRegistry,
        plugins: PluginRegistry,
    ) -> Self {
        let toolchain = Toolchain::new(&config.jsx_import_source);
        Self {
            root: root.into(),
            config,
            pages: Arc::new(pages),
            plugins: Arc::new(plugins),
            toolchain,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AtollConfig {
        &self.config
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    pub fn src_dir(&self) -> PathBuf {
        self.config.src_path(&self.root)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.config.out_path(&self.root)
    }

    pub fn client_dir(&self) -> PathBuf {
        atoll_bundler::OutputLayout::new(self.out_dir()).client
    }

    fn build_options(&self) -> BuildOptions {
        let mut options = BuildOptions::new(self.src_dir(), self.out_dir());
        options.hydration_runtime = self.config.hydration_runtime.clone();
        options
    }

    /// Create a fresh build context for `generation` and run both passes
    /// into its staging directory.
    ///
    /// On failure the context is disposed; the live output is untouched.
    pub async fn build(&self, generation: u64) -> Result<(BuildContext, BuildReport)> {
        let ctx = BuildContext::create(
            self.build_options(),
            self.toolchain.clone(),
            self.plugins.clone(),
            generation,
        )
        .await?;
        match ctx.build().await {
            Ok(report) => Ok((ctx, report)),
            Err(err) => {
                ctx.dispose();
                Err(err.into())
            }
        }
    }

    /// Discover routes in the staged server output of `ctx`.
    pub fn route_table(&self, ctx: &BuildContext) -> Result<RouteTable> {
        let table = RouteTableBuilder::new(ctx.staging().pages_dir())
            .build(self.pages.as_ref(), ctx.generation())?;
        Ok(table)
    }

    /// Pages registered in code with no compiled page file
    pub fn unmatched_pages(&self, table: &RouteTable) -> Vec<String> {
        self.pages
            .keys()
            .filter(|key| !table.routes().iter().any(|r| r.page_key == *key))
            .map(str::to_string)
            .collect()
    }

    /// Build `generation`, discover its routes and make its output live.
    ///
    /// Nothing is committed unless both the build and route discovery
    /// succeed; a failure disposes the fresh context before returning.
    pub async fn prepare(&self, generation: u64) -> Result<Prepared> {
        let (ctx, report) = self.build(generation).await?;
        let committed = match self.route_table(&ctx) {
            Ok(table) => ctx.commit().await.map(|()| table).map_err(Into::into),
            Err(err) => Err(err),
        };
        match committed {
            Ok(table) => Ok(Prepared { ctx, report, table }),
            Err(err) => {
                ctx.dispose();
                Err(err)
            }
        }
    }

    /// Print the outcome of a build to the terminal.
    pub fn print_summary(&self, prepared: &Prepared) {
        let report = &prepared.report;
        ui::success(&format!(
            "Built {} server and {} client modules ({} islands, {} routes) in {}",
            report.server_modules,
            report.client_modules,
            report.islands.len(),
            prepared.table.len(),
            ui::format_duration(report.duration)
        ));
        for warning in &report.warnings {
            ui::warning(&warning.to_string());
        }
        for route in prepared.table.routes() {
            tracing::debug!(
                pattern = %route.url_pattern,
                methods = ?route.methods(),
                file = %prepared.page_file(route).display(),
                "route"
            );
        }
        for key in self.unmatched_pages(&prepared.table) {
            ui::warning(&format!(
                "Page \"{key}\" is registered but no pages/ file provides it"
            ));
        }
    }

    pub fn composer(&self, live_reload_src: Option<String>) -> RenderComposer {
        let composer = RenderComposer::new(self.plugins.clone());
        match live_reload_src {
            Some(src) => composer.with_live_reload(src),
            None => composer,
        }
    }
}
