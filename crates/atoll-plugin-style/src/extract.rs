//! Class name extraction from rendered markup

use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("class attribute pattern is valid")
});

/// Every class used in `html`, in order of first appearance.
pub fn extract_classes(html: &str) -> IndexSet<String> {
    let mut classes = IndexSet::new();
    for captures in CLASS_ATTR.captures_iter(html) {
        let Some(value) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        for class in value.as_str().split_whitespace() {
            if !classes.contains(class) {
                classes.insert(class.to_string());
            }
        }
    }
    classes
}
