//! # atoll-core
//!
//! The framework-independent heart of atoll:
//!
//! - [`routes`]: compiled page tree → ordered [`RouteTable`]
//! - [`module`]: page modules, handlers per HTTP method and the
//!   [`PageRegistry`] loader
//! - [`handler`]: the [`Handler`] contract and [`RequestContext`]
//! - [`component`]: server-rendered component tree and [`Island`]
//! - [`plugin`]: the [`Plugin`] trait and its ordered [`PluginRegistry`]
//! - [`render`]: the [`RenderComposer`] producing full HTML documents

pub mod component;
pub mod document;
pub mod error;
pub mod handler;
pub mod module;
pub mod plugin;
pub mod render;
pub mod routes;

pub use component::{Component, Element, Fragment, Island, Markup, Text};
pub use document::Document;
pub use error::{DiscoveryError, HandlerError, PluginError};
pub use handler::{Handler, HandlerFuture, Reply, RequestContext, ResponseParts, SharedHandler};
pub use module::{Method, ModuleLoader, PageModule, PageRegistry};
pub use plugin::{IslandInfo, Plugin, PluginRegistry};
pub use render::{Metadata, RenderComposer, RenderContext};
pub use routes::{RouteDescriptor, RouteMatch, RouteTable, RouteTableBuilder};

/// HTTP types used by handlers building their own responses
pub use axum::http;
pub use axum::response::Response;

/// Re-exported so plugins can work on island trees without a direct
/// dependency on the syntax crate.
pub use atoll_gen;
