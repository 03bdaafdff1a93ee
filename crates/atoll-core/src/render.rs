//! Render composer: component tree + plugin fragments → HTML document

use crate::component::{Component, escape_attr, escape_html};
use crate::document::Document;
use crate::plugin::PluginRegistry;
use std::sync::Arc;

/// Head metadata a handler sets for its page.
///
/// Rendered into `<head>` by a head plugin; the composer itself only reads
/// it through [`RenderContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    /// Attribute lists of `<meta>` tags, in insertion order
    pub meta: Vec<Vec<(String, String)>>,
    /// Attribute lists of `<link>` tags, in insertion order
    pub link: Vec<Vec<(String, String)>>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.meta.is_empty() && self.link.is_empty()
    }
}

/// Render a tag's attribute list as ` name="value"` pairs
pub fn render_attrs(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attr(value)))
        .collect()
}

/// Per-request input to plugin rendering
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Request path
    pub path: &'a str,
    pub metadata: &'a Metadata,
}

impl<'a> RenderContext<'a> {
    pub fn new(path: &'a str, metadata: &'a Metadata) -> Self {
        Self { path, metadata }
    }
}

/// Builds full HTML documents from a page component.
///
/// Head order: charset, plugin fragments, live-reload script (dev only).
#[derive(Debug, Clone, Default)]
pub struct RenderComposer {
    plugins: Arc<PluginRegistry>,
    live_reload_src: Option<String>,
}

impl RenderComposer {
    pub fn new(plugins: Arc<PluginRegistry>) -> Self {
        Self {
            plugins,
            live_reload_src: None,
        }
    }

    /// Inject `<script src=..>` for the live-reload client into every page
    pub fn with_live_reload(mut self, script_src: impl Into<String>) -> Self {
        self.live_reload_src = Some(script_src.into());
        self
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Render `component` and let every plugin contribute to the document.
    pub fn document(&self, component: &dyn Component, cx: &RenderContext<'_>) -> Document {
        let mut document = Document::with_body(component.render());
        self.plugins.render_fold(&mut document, cx);
        document
    }

    /// Render `component` to a complete HTML page.
    pub fn compose(&self, component: &dyn Component, cx: &RenderContext<'_>) -> String {
        let document = self.document(component, cx);
        self.serialize(&document)
    }

    pub fn serialize(&self, document: &Document) -> String {
        let mut head = String::from("<meta charset=\"utf-8\">");
        head.push_str(&document.head_html());
        if let Some(src) = &self.live_reload_src {
            head.push_str(&format!(
                "<script type=\"module\" src=\"{}\"></script>",
                escape_attr(src)
            ));
        }

        format!(
            "<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>",
            body = document.body_html()
        )
    }
}

/// Minimal error page used by the dispatcher for 404/500 responses
pub fn error_page(status: u16, message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{status}</title></head>\
         <body><h1>{status}</h1><p>{}</p></body></html>",
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Element, Markup};
    use crate::plugin::Plugin;

    struct Title;

    impl Plugin for Title {
        fn name(&self) -> &str {
            "title"
        }

        fn render(&self, document: &mut Document, cx: &RenderContext<'_>) {
            if let Some(title) = &cx.metadata.title {
                document.push_head(format!("<title>{}</title>", escape_html(title)));
            }
        }
    }

    #[test]
    fn compose_wraps_markup_and_plugin_fragments() {
        let mut plugins = PluginRegistry::new();
        plugins.register(Title).unwrap();
        let composer = RenderComposer::new(Arc::new(plugins));

        let metadata = Metadata {
            title: Some("Home".into()),
            ..Default::default()
        };
        let html = composer.compose(
            &Element::new("h1").text("Hello"),
            &RenderContext::new("/", &metadata),
        );

        assert_eq!(
            html,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Home</title></head>\
             <body><h1>Hello</h1></body></html>"
        );
    }

    #[test]
    fn live_script_follows_plugin_fragments() {
        let mut plugins = PluginRegistry::new();
        plugins.register(Title).unwrap();
        let composer = RenderComposer::new(Arc::new(plugins))
            .with_live_reload("http://localhost:3001/live-reload.js");

        let metadata = Metadata {
            title: Some("T".into()),
            ..Default::default()
        };
        let html = composer.compose(&Markup::new("<p></p>"), &RenderContext::new("/", &metadata));

        let charset = html.find("charset").unwrap();
        let title = html.find("<title>").unwrap();
        let live = html.find("live-reload.js").unwrap();
        assert!(charset < title && title < live, "{html}");
        assert!(!html.contains("importmap"), "{html}");
    }
}
