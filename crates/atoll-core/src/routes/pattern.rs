//! File path → URL pattern conversion

use crate::error::DiscoveryError;
use std::path::{Component, Path};

/// Extensions of compiled page files that take part in routing
pub const PAGE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

pub fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    /// `:name`, written `+name` in the file tree
    Param(String),
}

/// Routing identity of one page file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    /// Path below `pages/` without extension, `/`-separated
    pub page_key: String,
    /// URL pattern such as `/posts/:postId`
    pub pattern: String,
    pub segments: Vec<Segment>,
}

impl PagePath {
    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }
}

/// Convert a page file path, relative to the pages root, into its page key
/// and URL pattern.
///
/// `+name` segments become `:name`; every `index` segment collapses into
/// its parent, so `index.js` is `/` and `security/index.js` is `/security`.
pub fn page_path(relative: &Path) -> Result<PagePath, DiscoveryError> {
    let mut parts: Vec<String> = Vec::new();
    let components: Vec<_> = relative.components().collect();

    for (i, component) in components.iter().enumerate() {
        let Component::Normal(name) = component else {
            continue;
        };
        let is_last = i + 1 == components.len();
        let part = if is_last {
            Path::new(name).file_stem().unwrap_or(name)
        } else {
            name
        };
        parts.push(part.to_string_lossy().into_owned());
    }

    let page_key = parts.join("/");

    let mut segments = Vec::new();
    for part in &parts {
        if part == "index" {
            continue;
        }
        match part.strip_prefix('+') {
            Some("") => {
                return Err(DiscoveryError::InvalidSegment {
                    path: relative.to_path_buf(),
                    segment: part.clone(),
                });
            }
            Some(name) => segments.push(Segment::Param(name.to_string())),
            None => segments.push(Segment::Static(part.clone())),
        }
    }

    let pattern = format!(
        "/{}",
        segments
            .iter()
            .map(|s| match s {
                Segment::Static(name) => name.clone(),
                Segment::Param(name) => format!(":{name}"),
            })
            .collect::<Vec<_>>()
            .join("/")
    );

    Ok(PagePath {
        page_key,
        pattern,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(path: &str) -> String {
        page_path(Path::new(path)).unwrap().pattern
    }

    #[test]
    fn index_files_collapse_into_their_parent() {
        assert_eq!(pattern("index.js"), "/");
        assert_eq!(pattern("security/index.js"), "/security");
        assert_eq!(pattern("docs/index/intro.jsx"), "/docs/intro");
    }

    #[test]
    fn plus_segments_are_dynamic() {
        let page = page_path(Path::new("posts/+postId.js")).unwrap();
        assert_eq!(page.pattern, "/posts/:postId");
        assert_eq!(page.page_key, "posts/+postId");
        assert!(page.is_dynamic());

        assert_eq!(pattern("+id.js"), "/:id");
        assert!(!page_path(Path::new("counter.js")).unwrap().is_dynamic());
    }

    #[test]
    fn only_the_last_extension_is_stripped() {
        let page = page_path(Path::new("widgets/chart.island.js")).unwrap();
        assert_eq!(page.page_key, "widgets/chart.island");
        assert_eq!(page.pattern, "/widgets/chart.island");
    }

    #[test]
    fn bare_plus_is_rejected() {
        let err = page_path(Path::new("posts/+.js")).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidSegment { .. }));
    }

    #[test]
    fn extension_allow_list() {
        for ext in PAGE_EXTENSIONS {
            assert!(is_page_file(Path::new(&format!("a.{ext}"))));
        }
        assert!(!is_page_file(Path::new("a.css")));
        assert!(!is_page_file(Path::new("a.js.map")));
        assert!(!is_page_file(Path::new("README")));
    }
}
