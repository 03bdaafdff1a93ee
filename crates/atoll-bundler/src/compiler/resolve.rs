//! Local module resolution and relative specifiers

use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};

/// Extensions compiled as JavaScript modules, in resolution order
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e))
}

/// Resolve a `./` or `../` specifier written in `from_file`.
///
/// Tries the exact path, then each script extension appended, then an
/// `index` file inside a directory of that name.
pub fn resolve_local(from_file: &Path, specifier: &str) -> Option<PathBuf> {
    let base = from_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(specifier)
        .clean();

    if base.is_file() && is_script(&base) {
        return Some(base);
    }

    for ext in SCRIPT_EXTENSIONS {
        let mut candidate = base.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if base.is_dir() {
        for ext in SCRIPT_EXTENSIONS {
            let candidate = base.join(format!("index.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}

/// Specifier that reaches `to` from a module living in `from_dir`.
///
/// Both paths must be absolute or both relative to the same root.
pub fn relative_specifier(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let target: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    let joined = parts.join("/");
    if joined.starts_with("../") {
        joined
    } else {
        format!("./{joined}")
    }
}
