//! Style plugin configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Emit a small reset ahead of the utility rules
    pub preflight: bool,

    /// Extra classes: class name → CSS declarations.
    ///
    /// Custom classes take precedence over built-in utilities of the same
    /// name.
    pub rules: IndexMap<String, String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            preflight: true,
            rules: IndexMap::new(),
        }
    }
}

impl StyleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    /// Add a custom class, e.g. `rule("btn", "padding:0.5rem 1rem")`
    pub fn rule(mut self, class: impl Into<String>, declarations: impl Into<String>) -> Self {
        self.rules.insert(class.into(), declarations.into());
        self
    }
}
