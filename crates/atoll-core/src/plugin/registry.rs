//! Ordered plugin registry.
//!
//! Plugins run strictly in registration order, one after another, for both
//! document rendering and client injection.

use super::{IslandInfo, Plugin};
use crate::document::Document;
use crate::error::PluginError;
use crate::render::RenderContext;
use atoll_gen::SyntaxTree;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the plugin's `setup` once and append it.
    ///
    /// A plugin whose setup fails is not registered.
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) -> Result<(), PluginError> {
        self.register_shared(Arc::new(plugin))
    }

    pub fn register_shared(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        plugin.setup()?;
        tracing::debug!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Let every plugin add fragments to `document`, in registration order.
    pub fn render_fold(&self, document: &mut Document, cx: &RenderContext<'_>) {
        for plugin in &self.plugins {
            plugin.render(document, cx);
        }
    }

    /// Let every plugin rewrite an island tree, in registration order.
    ///
    /// Stops at the first failing plugin.
    pub fn inject_fold(
        &self,
        tree: &mut SyntaxTree<'_>,
        island: &IslandInfo,
    ) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            plugin.inject_on_client(tree, island)?;
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Metadata;
    use atoll_gen::Allocator;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tagger {
        tag: &'static str,
        setups: Arc<AtomicUsize>,
    }

    impl Plugin for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        fn setup(&self) -> Result<(), PluginError> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn render(&self, document: &mut Document, _cx: &RenderContext<'_>) {
            document.push_head(format!("<meta name=\"{}\">", self.tag));
        }

        fn inject_on_client(
            &self,
            tree: &mut SyntaxTree<'_>,
            _island: &IslandInfo,
        ) -> Result<(), PluginError> {
            tree.append_source(&format!("globalThis.order.push(\"{}\");", self.tag))?;
            Ok(())
        }
    }

    struct Broken;

    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn setup(&self) -> Result<(), PluginError> {
            Err(PluginError::setup("broken", "no rule table"))
        }
    }

    fn registry(tags: &[&'static str], setups: &Arc<AtomicUsize>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for &tag in tags {
            registry
                .register(Tagger {
                    tag,
                    setups: setups.clone(),
                })
                .unwrap();
        }
        registry
    }

    #[test]
    fn setup_runs_once_per_registration() {
        let setups = Arc::new(AtomicUsize::new(0));
        let registry = registry(&["a", "b"], &setups);
        assert_eq!(setups.load(Ordering::SeqCst), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn failed_setup_is_not_registered() {
        let mut registry = PluginRegistry::new();
        assert!(registry.register(Broken).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn render_fold_appends_in_registration_order() {
        let setups = Arc::new(AtomicUsize::new(0));
        let registry = registry(&["first", "second", "third"], &setups);
        let metadata = Metadata::default();
        let cx = RenderContext::new("/", &metadata);

        let mut document = Document::with_body("<main></main>".into());
        registry.render_fold(&mut document, &cx);

        assert_eq!(
            document.head,
            vec![
                "<meta name=\"first\">",
                "<meta name=\"second\">",
                "<meta name=\"third\">"
            ]
        );
        assert_eq!(document.body, vec!["<main></main>"]);
    }

    #[test]
    fn inject_fold_applies_plugins_in_registration_order() {
        let setups = Arc::new(AtomicUsize::new(0));
        let registry = registry(&["p1", "p2"], &setups);
        let island = IslandInfo {
            id: "counter".into(),
            path: PathBuf::from("components/counter.island.js"),
        };

        let allocator = Allocator::default();
        let mut tree = SyntaxTree::parse(
            &allocator,
            "export default function Counter() {}",
            Path::new("counter.island.js"),
        )
        .unwrap();
        registry.inject_fold(&mut tree, &island).unwrap();

        let printed = tree.print();
        let p1 = printed.find("\"p1\"").unwrap();
        let p2 = printed.find("\"p2\"").unwrap();
        assert!(p1 < p2, "{printed}");
    }
}
