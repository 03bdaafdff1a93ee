//! # atoll-gen
//!
//! Parse, rewrite and print JavaScript/TypeScript modules with OXC.
//!
//! atoll needs a narrow slice of an AST toolkit: read one module, splice a
//! few statements into it, find its default export, retarget its import
//! specifiers and print it again. [`SyntaxTree`] is that slice.
//!
//! ```rust
//! use atoll_gen::{Allocator, SyntaxTree};
//! use std::path::Path;
//!
//! let allocator = Allocator::default();
//! let mut tree = SyntaxTree::parse(
//!     &allocator,
//!     "export default function Counter() {}",
//!     Path::new("counter.island.js"),
//! )?;
//! tree.prepend_source("import { h } from \"preact\";")?;
//! assert!(tree.print().starts_with("import { h }"));
//! # Ok::<(), atoll_gen::GenError>(())
//! ```

pub mod error;
pub mod parser;
pub mod tree;

pub use error::{GenError, Result};
pub use parser::ParseOptions;
pub use tree::{DefaultExport, ModuleSpecifier, SpecifierKind, SyntaxTree};

pub use oxc_allocator::Allocator;
