//! Hydration injection for island modules.
//!
//! When the browser pass reads an island module, the injector rewrites it
//! into a self-mounting module:
//!
//! ```js
//! import { h as __atoll_h, hydrate as __atoll_hydrate } from "preact";
//! // ...original module...
//! for (const el of document.querySelectorAll("[data-island=\"counter\"]")) {
//!   __atoll_hydrate(__atoll_h(Counter, JSON.parse(el.dataset.props || "{}")), el);
//! }
//! ```
//!
//! after which every registered plugin may inject code of its own.

use crate::compiler::LoadHook;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::island::{is_island, island_id};
use atoll_core::{IslandInfo, PluginRegistry};
use atoll_gen::{Allocator, DefaultExport, SyntaxTree};
use std::path::Path;
use std::sync::Arc;

/// Binding given to anonymous default exports so the mount code can name them
const DEFAULT_BINDING: &str = "__atoll_island";

pub struct HydrationInjector {
    runtime: String,
    plugins: Arc<PluginRegistry>,
}

impl HydrationInjector {
    /// `runtime` must export `h` and `hydrate` (e.g. `preact`)
    pub fn new(runtime: impl Into<String>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            runtime: runtime.into(),
            plugins,
        }
    }

    fn bootstrap_import(&self) -> String {
        format!(
            "import {{ h as __atoll_h, hydrate as __atoll_hydrate }} from {};",
            js_string(&self.runtime)
        )
    }

    fn mount_statement(id: &str, component: &str) -> String {
        let selector = format!("[data-island=\"{id}\"]");
        format!(
            "for (const el of document.querySelectorAll({selector})) {{\n\
             __atoll_hydrate(__atoll_h({component}, JSON.parse(el.dataset.props || \"{{}}\")), el);\n\
             }}",
            selector = js_string(&selector),
        )
    }

    /// Rewrite one island module; see the module docs for the shape.
    pub fn inject(&self, path: &Path, source: &str) -> Result<String, Diagnostic> {
        let id = island_id(path);
        let allocator = Allocator::default();
        let mut tree =
            SyntaxTree::parse(&allocator, source, path).map_err(|e| Diagnostic::from_gen(path, e))?;

        let component = match tree.default_export() {
            None => {
                return Err(Diagnostic::error(
                    DiagnosticKind::Hydration,
                    format!("Island \"{id}\" has no default export to hydrate"),
                )
                .with_file(path)
                .with_help("Export the island component with `export default`"));
            }
            Some(DefaultExport::Expression) => {
                // No local binding: reach the default export through a self import.
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tree.prepend_source(&format!(
                    "import {DEFAULT_BINDING} from {};",
                    js_string(&format!("./{file_name}"))
                ))
                .map_err(|e| Diagnostic::from_gen(path, e))?;
                DEFAULT_BINDING.to_string()
            }
            Some(_) => tree
                .ensure_default_export_name(DEFAULT_BINDING)
                .unwrap_or_else(|| DEFAULT_BINDING.to_string()),
        };

        tree.prepend_source(&self.bootstrap_import())
            .map_err(|e| Diagnostic::from_gen(path, e))?;
        tree.append_source(&Self::mount_statement(&id, &component))
            .map_err(|e| Diagnostic::from_gen(path, e))?;

        let island = IslandInfo {
            id,
            path: path.to_path_buf(),
        };
        self.plugins.inject_fold(&mut tree, &island).map_err(|e| {
            Diagnostic::error(DiagnosticKind::Plugin, e.to_string()).with_file(path)
        })?;

        Ok(tree.print())
    }
}

impl LoadHook for HydrationInjector {
    fn name(&self) -> &str {
        "hydration"
    }

    fn applies_to(&self, path: &Path, source: &str) -> bool {
        is_island(path, source)
    }

    fn load(&self, path: &Path, source: &str) -> Result<String, Diagnostic> {
        let output = self.inject(path, source)?;
        tracing::debug!(island = %island_id(path), "injected hydration bootstrap");
        Ok(output)
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
