#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::ConfigError;
    use serial_test::serial;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &["ATOLL_PORT", "ATOLL_LIVE_PORT", "ATOLL_DEBUG", "ATOLL_SRC_DIR", "PORT"];

    fn clear_env() {
        for var in ENV_VARS {
            // SAFETY: env-touching tests are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("app/pages")).unwrap();
        dir
    }

    #[test]
    #[serial]
    fn defaults_apply_without_sources() {
        clear_env();
        let dir = project();
        let config = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config, AtollConfig::default());
        assert_eq!(config.src_dir, PathBuf::from("app"));
        assert_eq!(config.out_dir, PathBuf::from(".atoll"));
        config.validate(dir.path()).unwrap();
    }

    #[test]
    #[serial]
    fn file_env_port_and_cli_layer_in_order() {
        clear_env();
        let dir = project();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "port = 4000\nlive_port = 4001\nhost = \"0.0.0.0\"\nwatch_ignore = [\"node_modules\", \"dist\"]\n",
        )
        .unwrap();

        let config = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.watch_ignore, ["node_modules", "dist"]);

        unsafe { std::env::set_var("ATOLL_PORT", "5000") };
        let config = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 5000);

        unsafe { std::env::set_var("PORT", "6000") };
        let config = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 6000);

        let overrides = ConfigOverrides {
            port: Some(7000),
            ..ConfigOverrides::default()
        };
        let config = AtollConfig::load(dir.path(), None, &overrides).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.live_port, 4001);

        clear_env();
    }

    #[test]
    #[serial]
    fn debug_flag_from_env() {
        clear_env();
        let dir = project();
        unsafe { std::env::set_var("ATOLL_DEBUG", "true") };
        let config = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert!(config.debug);
        clear_env();
    }

    #[test]
    #[serial]
    fn explicit_config_file_must_exist() {
        clear_env();
        let dir = project();
        let err = AtollConfig::load(
            dir.path(),
            Some(Path::new("missing.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn invalid_types_are_reported() {
        clear_env();
        let dir = project();
        fs::write(dir.path().join(CONFIG_FILE), "port = \"soon\"\n").unwrap();
        let err = AtollConfig::load(dir.path(), None, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validation_rejects_bad_layouts() {
        let dir = project();

        let same_ports = AtollConfig {
            live_port: 3000,
            ..AtollConfig::default()
        };
        assert!(same_ports.validate(dir.path()).is_err());

        let same_dirs = AtollConfig {
            out_dir: PathBuf::from("app"),
            ..AtollConfig::default()
        };
        assert!(same_dirs.validate(dir.path()).is_err());

        let empty_src = AtollConfig {
            src_dir: PathBuf::new(),
            ..AtollConfig::default()
        };
        assert!(empty_src.validate(dir.path()).is_err());

        let missing_src = AtollConfig {
            src_dir: PathBuf::from("web"),
            ..AtollConfig::default()
        };
        let err = missing_src.validate(dir.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
