//! Configuration for atoll apps.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `atoll.toml` in the project root (or the file given by `--config`)
//! 3. `ATOLL_*` environment variables (`ATOLL_PORT`, `ATOLL_LIVE_PORT`,
//!    `ATOLL_DEBUG`, ...)
//! 4. `PORT`
//! 5. command-line flags

mod loading;
mod tests;
mod validation;

pub use loading::{CONFIG_FILE, ConfigOverrides};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtollConfig {
    /// Source root holding `pages/`
    pub src_dir: PathBuf,

    /// Build output root
    pub out_dir: PathBuf,

    pub host: String,

    /// App server port
    pub port: u16,

    /// Live-reload server port (dev only)
    pub live_port: u16,

    /// Debug logging for every atoll crate
    pub debug: bool,

    /// Module providing the automatic JSX runtime
    pub jsx_import_source: String,

    /// Module exporting `h` and `hydrate` for islands
    pub hydration_runtime: String,

    /// Paths below the source root the dev watcher ignores
    pub watch_ignore: Vec<String>,

    pub debounce_ms: u64,
}

impl Default for AtollConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("app"),
            out_dir: PathBuf::from(".atoll"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            live_port: 35729,
            debug: false,
            jsx_import_source: "preact".to_string(),
            hydration_runtime: "preact".to_string(),
            watch_ignore: vec!["node_modules".to_string(), "*.log".to_string()],
            debounce_ms: 100,
        }
    }
}

impl AtollConfig {
    /// Source root resolved against the project root
    pub fn src_path(&self, root: &Path) -> PathBuf {
        root.join(&self.src_dir)
    }

    /// Output root resolved against the project root
    pub fn out_path(&self, root: &Path) -> PathBuf {
        root.join(&self.out_dir)
    }
}
