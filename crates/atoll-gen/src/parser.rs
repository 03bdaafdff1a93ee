//! Parser façade for reading page and component modules
//!
//! Every atoll source file is parsed through [`ParseOptions`] so that `.js`
//! files accept JSX the same way `.jsx` files do.

use crate::error::{GenError, Result};
use oxc_span::SourceType;
use std::path::Path;

/// Parse options for reading source code
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Source type (JavaScript, TypeScript, JSX, TSX)
    pub source_type: SourceType,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_type: SourceType::mjs().with_jsx(true),
        }
    }
}

impl ParseOptions {
    /// Create parse options from a file path.
    ///
    /// Plain JavaScript files are parsed with JSX enabled, matching the
    /// `.js` → `jsx` loader convention of component trees.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source_type = SourceType::from_path(path).map_err(|_| GenError::UnsupportedSource {
            path: path.display().to_string(),
        })?;

        let source_type = if source_type.is_typescript() {
            source_type.with_module(true)
        } else {
            source_type.with_module(true).with_jsx(true)
        };

        Ok(Self { source_type })
    }

    /// Create parse options for TSX
    pub fn tsx() -> Self {
        Self {
            source_type: SourceType::tsx(),
        }
    }
}
