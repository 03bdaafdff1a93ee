//! Utility-class styling plugin for atoll
//!
//! Pages use utility classes (`p-4`, `flex`, `md:text-lg`,
//! `hover:bg-blue-700`, ...) in their markup; for every rendered document the
//! plugin collects the classes actually used and adds one `<style>` block
//! with just those rules.
//!
//! ## Architecture
//!
//! ```text
//! setup()  → install RuleTable (static table + custom rules)
//!                     ↓
//! render() → extract class attrs from body → stylesheet → <style> in head
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use atoll_core::PluginRegistry;
//! use atoll_plugin_style::{StyleConfig, StylePlugin};
//!
//! let mut plugins = PluginRegistry::new();
//! let config = StyleConfig::new().rule("btn", "padding:0.5rem 1rem;border-radius:0.25rem");
//! plugins.register(StylePlugin::with_config(config)).unwrap();
//! ```

use atoll_core::{Document, Plugin, PluginError, RenderContext};
use std::sync::OnceLock;

mod config;
mod extract;
mod rules;

pub use config::StyleConfig;
pub use extract::extract_classes;
pub use rules::RuleTable;

#[derive(Debug, Default)]
pub struct StylePlugin {
    config: StyleConfig,
    table: OnceLock<RuleTable>,
}

impl StylePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StyleConfig) -> Self {
        Self {
            config,
            table: OnceLock::new(),
        }
    }

    /// The installed rule table; `None` until `setup` has run
    pub fn table(&self) -> Option<&RuleTable> {
        self.table.get()
    }
}

impl Plugin for StylePlugin {
    fn name(&self) -> &str {
        "style"
    }

    fn setup(&self) -> Result<(), PluginError> {
        for (class, declarations) in &self.config.rules {
            if class.is_empty() || class.contains(char::is_whitespace) || class.contains(':') {
                return Err(PluginError::setup(
                    self.name(),
                    format!("invalid custom class name {class:?}"),
                ));
            }
            if declarations.trim().is_empty() {
                return Err(PluginError::setup(
                    self.name(),
                    format!("custom class {class:?} has no declarations"),
                ));
            }
        }

        if self.table.set(RuleTable::new(&self.config)).is_err() {
            tracing::debug!("style rule table already installed");
        }
        tracing::debug!(custom_rules = self.config.rules.len(), "installed style rules");
        Ok(())
    }

    fn render(&self, document: &mut Document, cx: &RenderContext<'_>) {
        let Some(table) = self.table.get() else {
            tracing::warn!("style plugin rendered before setup, skipping");
            return;
        };
        let classes = extract_classes(&document.body_html());
        if let Some(css) = table.stylesheet(classes.iter().map(String::as_str)) {
            tracing::trace!(path = cx.path, classes = classes.len(), "generated styles");
            document.push_head(format!("<style data-atoll-style>{css}</style>"));
        }
    }
}
