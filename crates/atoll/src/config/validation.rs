use crate::config::AtollConfig;
use crate::error::ConfigError;
use std::path::Path;

impl AtollConfig {
    /// Check the configuration for a project rooted at `root`.
    pub fn validate(&self, root: &Path) -> Result<(), ConfigError> {
        if self.src_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value(
                "src_dir",
                "",
                "Point src_dir at the directory holding pages/",
            ));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value(
                "out_dir",
                "",
                "Use a dedicated build directory such as .atoll",
            ));
        }
        if self.src_dir == self.out_dir {
            return Err(ConfigError::invalid_value(
                "out_dir",
                self.out_dir.display().to_string(),
                "Output is wiped on every build and must differ from src_dir",
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "port",
                "0",
                "Use a fixed port; the dev server already falls back to the next free one",
            ));
        }
        if self.port == self.live_port {
            return Err(ConfigError::invalid_value(
                "live_port",
                self.live_port.to_string(),
                "The live-reload server needs its own port",
            ));
        }

        let src = self.src_path(root);
        if !src.is_dir() {
            return Err(ConfigError::invalid_value(
                "src_dir",
                src.display().to_string(),
                "Source directory does not exist",
            ));
        }
        Ok(())
    }
}
