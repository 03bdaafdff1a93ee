//! Page modules and how they are loaded for a compiled page file

use crate::error::DiscoveryError;
use crate::handler::{Handler, SharedHandler};
use axum::http::Method as HttpMethod;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// HTTP methods a page module can export a handler for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub fn from_http(method: &HttpMethod) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == method.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The handlers one page file exposes.
///
/// A module with no handlers (a shared component living under `pages/`)
/// produces no route.
#[derive(Clone, Default)]
pub struct PageModule {
    handlers: IndexMap<Method, SharedHandler>,
}

impl fmt::Debug for PageModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageModule")
            .field("methods", &self.methods())
            .finish()
    }
}

impl PageModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, method: Method, handler: impl Handler) -> Self {
        self.handlers.insert(method, Arc::new(handler));
        self
    }

    pub fn get(self, handler: impl Handler) -> Self {
        self.handler(Method::Get, handler)
    }

    pub fn post(self, handler: impl Handler) -> Self {
        self.handler(Method::Post, handler)
    }

    pub fn put(self, handler: impl Handler) -> Self {
        self.handler(Method::Put, handler)
    }

    pub fn delete(self, handler: impl Handler) -> Self {
        self.handler(Method::Delete, handler)
    }

    pub fn methods(&self) -> Vec<Method> {
        self.handlers.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn into_handlers(self) -> IndexMap<Method, SharedHandler> {
        self.handlers
    }
}

/// Turns a compiled page file into its page module.
///
/// `generation` increases on every rebuild; a loader must hand out fresh
/// module state for each generation instead of reusing an earlier one.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, page_key: &str, file: &Path, generation: u64)
    -> Result<PageModule, DiscoveryError>;
}

type PageFactory = Arc<dyn Fn() -> PageModule + Send + Sync>;

/// Page modules registered by the application, keyed by page key.
///
/// The page key is the file path below `pages/` without its extension and
/// with `/` separators, e.g. `index`, `posts/+postId`, `security/index`.
/// Files without a registered factory are treated as handler-less modules.
#[derive(Clone, Default)]
pub struct PageRegistry {
    factories: IndexMap<String, PageFactory>,
}

impl fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module factory for `page_key`. The factory is called
    /// again on every rebuild.
    pub fn page<F>(mut self, page_key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> PageModule + Send + Sync + 'static,
    {
        self.factories.insert(page_key.into(), Arc::new(factory));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, page_key: &str) -> bool {
        self.factories.contains_key(page_key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ModuleLoader for PageRegistry {
    fn load(
        &self,
        page_key: &str,
        file: &Path,
        generation: u64,
    ) -> Result<PageModule, DiscoveryError> {
        // The compiled module must be present and readable even though its
        // handlers come from the registry.
        std::fs::File::open(file).map_err(|source| DiscoveryError::Unreadable {
            path: file.to_path_buf(),
            source,
        })?;

        match self.factories.get(page_key) {
            Some(factory) => {
                let module = factory();
                tracing::trace!(page_key, generation, methods = ?module.methods(), "loaded page module");
                Ok(module)
            }
            None => Ok(PageModule::new()),
        }
    }
}
