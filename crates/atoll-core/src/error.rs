//! Error types for route discovery, page handlers and plugins

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::module::Method;

/// Errors raised while turning compiled page files into a route table.
///
/// Every variant is fatal for the build that produced it: at startup the
/// process exits, during a rebuild the previous table stays in service.
#[derive(Error, Debug, Diagnostic)]
pub enum DiscoveryError {
    /// Walking the pages directory failed
    #[error("Failed to scan pages directory {}: {source}", dir.display())]
    #[diagnostic(code(atoll::routes::walk_failed))]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A page file exists but cannot be read
    #[error("Cannot read page module {}: {source}", path.display())]
    #[diagnostic(code(atoll::routes::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The module loader refused a page file
    #[error("Failed to load page module {}: {message}", path.display())]
    #[diagnostic(code(atoll::routes::load_failed))]
    Load { path: PathBuf, message: String },

    /// A path segment cannot be turned into a URL segment
    #[error("Invalid route segment `{segment}` in {}", path.display())]
    #[diagnostic(
        code(atoll::routes::invalid_segment),
        help("Dynamic segments are written `+name`, e.g. `pages/posts/+postId.jsx`")
    )]
    InvalidSegment { path: PathBuf, segment: String },

    /// Two files produce the same URL pattern for the same method
    #[error(
        "Route conflict: {method} {pattern} is defined by both {} and {}",
        first.display(),
        second.display()
    )]
    #[diagnostic(
        code(atoll::routes::conflict),
        help("Keep only one of `name.jsx` and `name/index.jsx` for a given method")
    )]
    Conflict {
        pattern: String,
        method: Method,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Errors returned by page handlers.
///
/// The dispatcher answers `BadRequest` with 400 and everything else with a
/// generic 500; the detail only reaches the log.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Errors raised by plugins during setup or client injection
#[derive(Error, Debug, Diagnostic)]
pub enum PluginError {
    #[error("Plugin `{plugin}` failed to set up: {message}")]
    #[diagnostic(code(atoll::plugin::setup_failed))]
    Setup { plugin: String, message: String },

    #[error("Plugin `{plugin}` failed to inject into {island}: {message}")]
    #[diagnostic(code(atoll::plugin::inject_failed))]
    Inject {
        plugin: String,
        island: String,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Gen(#[from] atoll_gen::GenError),
}

impl PluginError {
    pub fn setup(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}
