//! Application builder handed to [`run`](crate::run).

use crate::error::Result;
use atoll_core::{PageModule, PageRegistry, Plugin, PluginRegistry};
use std::sync::Arc;

/// Pages and plugins of an atoll application.
///
/// ```no_run
/// use atoll::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> miette::Result<()> {
///     let app = App::new().page("index", || {
///         PageModule::new().get(|_cx: RequestContext| async {
///             Ok::<_, HandlerError>(Reply::component(Element::new("h1").text("hi")))
///         })
///     });
///     atoll::run(app).await
/// }
/// ```
#[derive(Default)]
pub struct App {
    pages: PageRegistry,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("pages", &self.pages)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `pages` as the page registry, replacing pages added so far.
    pub fn pages(mut self, pages: PageRegistry) -> Self {
        self.pages = pages;
        self
    }

    /// Register the module for the page file `pages/<page_key>.*`.
    pub fn page<F>(mut self, page_key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> PageModule + Send + Sync + 'static,
    {
        self.pages = self.pages.page(page_key, factory);
        self
    }

    /// Add a plugin. Plugins run in the order they are added.
    pub fn plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Run every plugin's `setup` and split into the project parts.
    pub(crate) fn into_parts(self) -> Result<(PageRegistry, PluginRegistry)> {
        let mut registry = PluginRegistry::new();
        for plugin in self.plugins {
            registry.register_shared(plugin)?;
        }
        Ok((self.pages, registry))
    }
}
