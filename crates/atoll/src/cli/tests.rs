#[cfg(test)]
mod tests {
    use crate::cli::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dev_flags_become_overrides() {
        let cli = parse(&[
            "atoll", "dev", "--port", "4000", "--live-port", "4001", "--src", "web", "--debug",
        ]);
        assert!(matches!(cli.command, Command::Dev(_)));

        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(4000));
        assert_eq!(overrides.live_port, Some(4001));
        assert_eq!(overrides.src_dir.as_deref(), Some(std::path::Path::new("web")));
        assert_eq!(overrides.debug, Some(true));
    }

    #[test]
    fn unset_flags_leave_config_alone() {
        let cli = parse(&["atoll", "build"]);
        let overrides = cli.overrides();
        assert!(overrides.port.is_none());
        assert!(overrides.src_dir.is_none());
        assert!(overrides.debug.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["atoll", "serve", "--verbose", "--no-color", "-c", "site.toml"]);
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("site.toml")));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["atoll", "dev", "-v", "-q"]).is_err());
    }
}
