//! Island detection and client entry generation.
//!
//! A module is an island when its file name ends in `.island.{js,jsx,ts,tsx}`
//! or when it carries a `// @island` line comment. Detection works on the
//! source text, before compilation strips comments.

use crate::compiler::relative_specifier;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const ISLAND_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

static ISLAND_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*//\s*@island\b").expect("island marker pattern is valid")
});

/// `counter.island.jsx` style file names
pub fn has_island_name(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    ISLAND_EXTENSIONS.contains(&ext)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(".island"))
}

/// Whether the source carries a `// @island` marker line
pub fn has_island_marker(source: &str) -> bool {
    ISLAND_MARKER.is_match(source)
}

pub fn is_island(path: &Path, source: &str) -> bool {
    has_island_name(path) || has_island_marker(source)
}

/// Island id: the file stem without its `.island` suffix
pub fn island_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(".island") {
        Some(id) => id.to_string(),
        None => stem,
    }
}

/// File name of an island's client entry
pub fn client_entry_name(id: &str) -> String {
    format!("{id}.client.js")
}

/// One detected island and its generated client entry stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandEntry {
    pub id: String,
    pub source: PathBuf,
    pub stub: PathBuf,
}

/// Finds the islands among the server pass inputs and writes one client
/// entry stub per island into the generated directory.
#[derive(Debug, Clone)]
pub struct IslandCollector {
    generated_dir: PathBuf,
}

impl IslandCollector {
    pub fn new(generated_dir: impl Into<PathBuf>) -> Self {
        Self {
            generated_dir: generated_dir.into(),
        }
    }

    /// Detect islands among `sources` and write their stubs.
    ///
    /// Two islands sharing an id are an error since their client entries
    /// would overwrite each other.
    pub async fn collect(&self, sources: &[PathBuf]) -> Result<Vec<IslandEntry>, Vec<Diagnostic>> {
        let mut islands: Vec<IslandEntry> = Vec::new();
        let mut errors = Vec::new();

        for source in sources {
            let text = match tokio::fs::read_to_string(source).await {
                Ok(text) => text,
                Err(e) => {
                    errors.push(
                        Diagnostic::error(DiagnosticKind::Read, format!("Failed to read module: {e}"))
                            .with_file(source),
                    );
                    continue;
                }
            };
            if !is_island(source, &text) {
                continue;
            }

            let id = island_id(source);
            if let Some(existing) = islands.iter().find(|i| i.id == id) {
                errors.push(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateIsland,
                        format!(
                            "Island id \"{id}\" is used by both {} and {}",
                            existing.source.display(),
                            source.display()
                        ),
                    )
                    .with_file(source)
                    .with_help("Rename one of the files; the id is the file name without `.island`"),
                );
                continue;
            }

            islands.push(IslandEntry {
                stub: self.generated_dir.join(client_entry_name(&id)),
                id,
                source: source.clone(),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        if !islands.is_empty() {
            if let Err(e) = tokio::fs::create_dir_all(&self.generated_dir).await {
                return Err(vec![crate::compiler::write_error(&self.generated_dir, &e)]);
            }
        }

        for island in &islands {
            let specifier = relative_specifier(&self.generated_dir, &island.source);
            let stub = format!("import {};\n", serde_json::Value::String(specifier));
            if let Err(e) = tokio::fs::write(&island.stub, stub).await {
                return Err(vec![crate::compiler::write_error(&island.stub, &e)]);
            }
            tracing::debug!(island = %island.id, stub = %island.stub.display(), "wrote client entry stub");
        }

        Ok(islands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn island_file_names() {
        assert!(has_island_name(Path::new("components/counter.island.jsx")));
        assert!(has_island_name(Path::new("counter.island.ts")));
        assert!(!has_island_name(Path::new("counter.jsx")));
        assert!(!has_island_name(Path::new("counter.island.mjs")));
        assert!(!has_island_name(Path::new("island.jsx")));
    }

    #[test]
    fn island_marker_comment() {
        assert!(has_island_marker("// @island\nexport default function A() {}"));
        assert!(has_island_marker("import x from 'y';\n  //@island\n"));
        assert!(!has_island_marker("const s = \"// @island\";"));
        assert!(!has_island_marker("// @islands are great"));
    }

    #[test]
    fn ids_drop_the_island_suffix() {
        assert_eq!(island_id(Path::new("a/counter.island.jsx")), "counter");
        assert_eq!(island_id(Path::new("a/widget.jsx")), "widget");
    }

    #[tokio::test]
    async fn collector_writes_stubs_and_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app");
        let generated = dir.path().join(".atoll/.generated");
        std::fs::create_dir_all(src.join("components")).unwrap();
        std::fs::create_dir_all(src.join("other")).unwrap();

        let counter = src.join("components/counter.island.jsx");
        let marked = src.join("components/clock.jsx");
        let plain = src.join("components/card.jsx");
        std::fs::write(&counter, "export default function Counter() {}").unwrap();
        std::fs::write(&marked, "// @island\nexport default function Clock() {}").unwrap();
        std::fs::write(&plain, "export default function Card() {}").unwrap();

        let collector = IslandCollector::new(&generated);
        let islands = collector
            .collect(&[counter.clone(), marked.clone(), plain.clone()])
            .await
            .unwrap();

        let ids: Vec<_> = islands.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["counter", "clock"]);

        let stub = std::fs::read_to_string(generated.join("counter.client.js")).unwrap();
        assert_eq!(stub, "import \"../../app/components/counter.island.jsx\";\n");

        let duplicate = src.join("other/counter.island.jsx");
        std::fs::write(&duplicate, "export default function Counter() {}").unwrap();
        let errors = collector.collect(&[counter, duplicate]).await.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::DuplicateIsland);
    }
}
