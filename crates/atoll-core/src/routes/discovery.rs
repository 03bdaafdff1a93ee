//! Page discovery: compiled `pages/` tree → route table

use super::pattern::{is_page_file, page_path};
use super::table::{RouteDescriptor, RouteTable};
use crate::error::DiscoveryError;
use crate::module::{Method, ModuleLoader};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scans a compiled pages directory and loads each page module.
#[derive(Debug, Clone)]
pub struct RouteTableBuilder {
    pages_dir: PathBuf,
}

impl RouteTableBuilder {
    pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
        }
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Build the table for one build generation.
    ///
    /// Files are visited in sorted walk order. Modules without handlers are
    /// skipped. The result holds every static route before every dynamic
    /// route, each group in discovery order.
    pub fn build(
        &self,
        loader: &dyn ModuleLoader,
        generation: u64,
    ) -> Result<RouteTable, DiscoveryError> {
        if !self.pages_dir.is_dir() {
            tracing::warn!(dir = %self.pages_dir.display(), "pages directory not found, no routes");
            return Ok(RouteTable::new(Vec::new(), generation));
        }

        let mut discovered = Vec::new();
        let mut seen: FxHashMap<(Method, String), PathBuf> = FxHashMap::default();

        for entry in WalkDir::new(&self.pages_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                dir: self.pages_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_page_file(path) {
                continue;
            }

            let relative = path.strip_prefix(&self.pages_dir).unwrap_or(path);
            let page = page_path(relative)?;
            let module = loader.load(&page.page_key, path, generation)?;

            if module.is_empty() {
                tracing::debug!(page_key = %page.page_key, "page module exposes no handlers, skipped");
                continue;
            }

            for method in module.methods() {
                let key = (method, page.pattern.clone());
                if let Some(first) = seen.get(&key) {
                    return Err(DiscoveryError::Conflict {
                        pattern: page.pattern,
                        method,
                        first: first.clone(),
                        second: path.to_path_buf(),
                    });
                }
                seen.insert(key, path.to_path_buf());
            }

            tracing::debug!(
                pattern = %page.pattern,
                page_key = %page.page_key,
                methods = ?module.methods(),
                "discovered route"
            );

            discovered.push(RouteDescriptor {
                is_dynamic: page.is_dynamic(),
                url_pattern: page.pattern,
                source_path: path.to_path_buf(),
                page_key: page.page_key,
                segments: page.segments,
                handlers: module.into_handlers(),
            });
        }

        let (mut routes, dynamic): (Vec<_>, Vec<_>) =
            discovered.into_iter().partition(|route| !route.is_dynamic);
        routes.extend(dynamic);

        tracing::info!(routes = routes.len(), generation, "route table built");
        Ok(RouteTable::new(routes, generation))
    }
}
