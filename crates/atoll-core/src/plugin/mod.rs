//! Plugin contract
//!
//! A plugin can take part in three moments of an atoll app:
//!
//! - `setup`: once, when it is registered
//! - `render`: for every server-rendered document, to add head or body
//!   fragments
//! - `inject_on_client`: for every island module compiled for the browser,
//!   to splice code into its syntax tree
//!
//! Every method has an identity default, so a plugin only implements the
//! moments it cares about.

mod registry;

pub use registry::PluginRegistry;

use crate::document::Document;
use crate::error::PluginError;
use crate::render::RenderContext;
use atoll_gen::SyntaxTree;
use std::path::PathBuf;

/// The island module a client injection runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandInfo {
    /// Island id, e.g. `counter` for `counter.island.jsx`
    pub id: String,
    /// Source file of the island module
    pub path: PathBuf,
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// One-time initialization, called by [`PluginRegistry::register`].
    fn setup(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Contribute fragments to a server-rendered document.
    fn render(&self, _document: &mut Document, _cx: &RenderContext<'_>) {}

    /// Rewrite an island module before it is compiled for the browser.
    fn inject_on_client(
        &self,
        _tree: &mut SyntaxTree<'_>,
        _island: &IslandInfo,
    ) -> Result<(), PluginError> {
        Ok(())
    }
}
