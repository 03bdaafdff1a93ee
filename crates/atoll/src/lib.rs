//! # atoll
//!
//! Server-rendered pages with selectively hydrated islands, routed by the
//! file tree.
//!
//! An application registers the Rust handlers of its pages and its plugins
//! on an [`App`] and hands it to [`run`], which parses the command line and
//! runs one of:
//!
//! - `dev`: build, serve, rebuild on change and live-reload the browser
//! - `build`: build once and check the routes
//! - `serve`: build once and serve
//!
//! The page files under `<src>/pages` decide which URLs exist; the code
//! registered for each page key decides what they return.
//!
//! # Modules
//!
//! - [`config`]: layered configuration (`atoll.toml`, env, flags)
//! - [`server`]: request dispatch and the server lifecycle
//! - [`dev`]: watcher, rebuild coordinator and live-reload server
//! - [`error`], [`logger`], [`ui`]: the usual CLI plumbing

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod project;
pub mod server;
pub mod ui;

pub use app::App;
pub use config::AtollConfig;
pub use error::{CliError, ConfigError, Result};
pub use project::Project;

pub use atoll_bundler;
pub use atoll_core;

/// Everything a page module usually needs
pub mod prelude {
    pub use crate::App;
    pub use atoll_core::{
        Component, Element, Fragment, HandlerError, Island, Markup, PageModule, PageRegistry,
        Plugin, Reply, RequestContext, Text,
    };
}

use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse `std::env::args` and run the selected command.
pub async fn run(app: App) -> miette::Result<()> {
    run_with(app, Cli::parse()).await
}

/// Run an already parsed command line.
pub async fn run_with(app: App, cli: Cli) -> miette::Result<()> {
    ui::init_colors(cli.no_color);
    execute(app, cli).await.map_err(error::cli_error_to_miette)
}

/// Absolute, symlink-free project root
fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current.join(dir),
        None => current,
    };
    Ok(std::fs::canonicalize(root)?)
}

async fn execute(app: App, cli: Cli) -> Result<()> {
    let root = project_root(cli.project().cwd.as_deref())?;
    let config = AtollConfig::load(&root, cli.config.as_deref(), &cli.overrides())?;

    logger::init_logger(cli.verbose || config.debug, cli.quiet, cli.no_color);
    tracing::debug!(root = %root.display(), ?config, "configuration loaded");
    config.validate(&root)?;

    let (pages, plugins) = app.into_parts()?;
    tracing::debug!(pages = pages.len(), plugins = ?plugins.names(), "app registered");
    let project = Arc::new(Project::new(root, config, pages, plugins));

    match cli.command {
        Command::Dev(_) => commands::dev::execute(project).await,
        Command::Build(_) => commands::build::execute(&project).await,
        Command::Serve(_) => commands::serve::execute(&project).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn project_root_resolves_symlinks() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("site");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let root = project_root(Some(&link)).unwrap();
        assert_eq!(root, std::fs::canonicalize(&real).unwrap());
    }

    #[test]
    fn missing_project_root_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(project_root(Some(&dir.path().join("absent"))).is_err());
    }
}
