//! Head metadata plugin for atoll
//!
//! Handlers set head metadata on their request context:
//!
//! ```rust,ignore
//! cx.title("Posts");
//! cx.meta([("name", "description"), ("content", "All posts")]);
//! cx.link([("rel", "stylesheet"), ("href", "/public/site.css")]);
//! ```
//!
//! and this plugin turns it into `<title>`, `<meta>` and `<link>` tags in the
//! document head, in that order. Tags are appended as-is; two `meta` calls
//! with the same name produce two tags.
//!
//! ## Example Usage
//!
//! ```rust
//! use atoll_core::PluginRegistry;
//! use atoll_plugin_head::HeadPlugin;
//!
//! let mut plugins = PluginRegistry::new();
//! plugins
//!     .register(HeadPlugin::new().title_template("%s | My Site"))
//!     .unwrap();
//! ```

use atoll_core::component::escape_html;
use atoll_core::render::render_attrs;
use atoll_core::{Document, Plugin, RenderContext};

/// Placeholder for the page title in a title template
const TITLE_PLACEHOLDER: &str = "%s";

#[derive(Debug, Clone, Default)]
pub struct HeadPlugin {
    default_title: Option<String>,
    title_template: Option<String>,
}

impl HeadPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title used when a handler sets none
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = Some(title.into());
        self
    }

    /// Wrap handler titles, e.g. `"%s | My Site"`.
    ///
    /// Not applied to the default title.
    pub fn title_template(mut self, template: impl Into<String>) -> Self {
        self.title_template = Some(template.into());
        self
    }

    fn title(&self, cx: &RenderContext<'_>) -> Option<String> {
        match (&cx.metadata.title, &self.title_template) {
            (Some(title), Some(template)) => Some(template.replace(TITLE_PLACEHOLDER, title)),
            (Some(title), None) => Some(title.clone()),
            (None, _) => self.default_title.clone(),
        }
    }
}

impl Plugin for HeadPlugin {
    fn name(&self) -> &str {
        "head"
    }

    fn render(&self, document: &mut Document, cx: &RenderContext<'_>) {
        if let Some(title) = self.title(cx) {
            document.push_head(format!("<title>{}</title>", escape_html(&title)));
        }
        for attrs in &cx.metadata.meta {
            document.push_head(format!("<meta{}>", render_attrs(attrs)));
        }
        for attrs in &cx.metadata.link {
            document.push_head(format!("<link{}>", render_attrs(attrs)));
        }
        tracing::trace!(path = cx.path, tags = document.head.len(), "rendered head");
    }
}
