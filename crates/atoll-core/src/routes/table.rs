//! Ordered route table and request matching

use super::pattern::Segment;
use crate::handler::SharedHandler;
use crate::module::Method;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use rustc_hash::FxHashMap;
use std::fmt;
use std::path::PathBuf;

/// One page file's routes
#[derive(Clone)]
pub struct RouteDescriptor {
    pub url_pattern: String,
    pub source_path: PathBuf,
    pub page_key: String,
    pub is_dynamic: bool,
    pub segments: Vec<Segment>,
    pub handlers: IndexMap<Method, SharedHandler>,
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("url_pattern", &self.url_pattern)
            .field("source_path", &self.source_path)
            .field("page_key", &self.page_key)
            .field("is_dynamic", &self.is_dynamic)
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RouteDescriptor {
    pub fn methods(&self) -> Vec<Method> {
        self.handlers.keys().copied().collect()
    }

    /// Bind request path segments against this pattern
    fn bind(&self, request: &[String]) -> Option<IndexMap<String, String>> {
        if request.len() != self.segments.len() {
            return None;
        }
        let mut params = IndexMap::new();
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Static(name) if name == value => {}
                Segment::Static(_) => return None,
                Segment::Param(_) if value.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), value.clone());
                }
            }
        }
        Some(params)
    }
}

/// Result of matching a request against the table
#[derive(Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub handler: &'a SharedHandler,
    pub params: IndexMap<String, String>,
}

/// Routes in precedence order: static before dynamic, discovery order
/// within each group.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    lookup: FxHashMap<Method, FxHashMap<String, usize>>,
    generation: u64,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("generation", &self.generation)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Split a request path into decoded, non-empty segments.
pub fn request_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect()
}

impl RouteTable {
    /// Build a table from descriptors already in precedence order.
    pub fn new(routes: Vec<RouteDescriptor>, generation: u64) -> Self {
        let mut lookup: FxHashMap<Method, FxHashMap<String, usize>> = FxHashMap::default();
        for (index, route) in routes.iter().enumerate() {
            for method in route.handlers.keys() {
                lookup
                    .entry(*method)
                    .or_default()
                    .entry(route.url_pattern.clone())
                    .or_insert(index);
            }
        }
        Self {
            routes,
            lookup,
            generation,
        }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Descriptor index registered for `(method, pattern)`
    pub fn lookup(&self, method: Method, pattern: &str) -> Option<&RouteDescriptor> {
        let index = *self.lookup.get(&method)?.get(pattern)?;
        self.routes.get(index)
    }

    /// First route, in table order, whose pattern matches `path` and which
    /// has a handler for `method`.
    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        let segments = request_segments(path);

        // Static patterns come first in table order, so an exact hit is the
        // answer the ordered scan would give. A decoded `/` belongs to one
        // segment and must not be joined into a different pattern.
        if !segments.iter().any(|segment| segment.contains('/')) {
            let normalized = format!("/{}", segments.join("/"));
            if let Some(route) = self.lookup(method, &normalized).filter(|r| !r.is_dynamic) {
                if let Some(handler) = route.handlers.get(&method) {
                    return Some(RouteMatch {
                        route,
                        handler,
                        params: IndexMap::new(),
                    });
                }
            }
        }

        self.routes.iter().find_map(|route| {
            let handler = route.handlers.get(&method)?;
            let params = route.bind(&segments)?;
            Some(RouteMatch {
                route,
                handler,
                params,
            })
        })
    }
}
