use anyhow::Context;
use picostack_core::control::ProcessInvoker;
use picostack_core::{Action, Dispatcher, LifecycleConfig};

use crate::Cli;

/// Run `action` and return the process exit code.
pub fn run(cli: &Cli, action: Action) -> anyhow::Result<i32> {
    let config = resolve_config(cli)?;

    for warning in config.validate() {
        tracing::warn!("config: {}", warning.message);
    }

    let strict = config.strict;
    let invoker = ProcessInvoker::new(&config);
    let mut dispatcher = Dispatcher::new(config, invoker);

    let report = dispatcher.run(action, &mut |line: &str| println!("{line}"));

    if let Some(failed) = report.first_failure() {
        tracing::debug!(
            action = %report.action,
            call = %failed.call,
            outcome = %failed.outcome,
            strict,
            "first failed call"
        );
    }
    Ok(report.exit_code(strict))
}

/// Defaults, then the config file, then flags and environment.
pub(crate) fn resolve_config(cli: &Cli) -> anyhow::Result<LifecycleConfig> {
    let mut config =
        LifecycleConfig::load(cli.config.as_deref()).context("failed to load config")?;

    if let Some(binary) = &cli.binary {
        config.binary = binary.clone();
    }
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(group) = &cli.group {
        config.group = group.clone();
    }
    if let Some(lock_file) = &cli.lock_file {
        config.lock_file = lock_file.clone();
    }
    if let Some(deescalation) = cli.deescalation {
        config.deescalation = deescalation;
    }
    // A flag can turn strict mode on but not off.
    config.strict |= cli.strict;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use picostack_core::Deescalation;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("picostack").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "user: from-file\ngroup: from-file\nstrict: true\n").unwrap();
        let path_str = path.to_str().unwrap();

        let cli = parse(&[
            "--config",
            path_str,
            "--user",
            "from-flag",
            "--deescalation",
            "none",
            "stop",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.user, "from-flag");
        assert_eq!(config.group, "from-file");
        assert_eq!(config.deescalation, Deescalation::None);
        assert!(config.strict);
    }

    #[test]
    fn missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        let cli = parse(&["--config", missing.to_str().unwrap(), "start"]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("config file not found"));
    }

    #[test]
    fn lock_file_and_binary_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "").unwrap();
        let cli = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--lock-file",
            "/tmp/picostack.lock",
            "--binary",
            "/opt/picostk",
            "start",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.lock_file, PathBuf::from("/tmp/picostack.lock"));
        assert_eq!(config.binary, PathBuf::from("/opt/picostk"));
        assert!(!config.strict);
    }

    #[test]
    fn strict_flag_enables_strict_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "").unwrap();
        let cli = parse(&["--config", path.to_str().unwrap(), "--strict", "stop"]);
        assert!(cli.strict);
        assert!(resolve_config(&cli).unwrap().strict);
    }

    #[test]
    fn only_the_first_positional_is_the_action() {
        let cli = parse(&["start", "now", "--whatever"]);
        assert_eq!(cli.action.as_deref(), Some("start"));
        assert_eq!(cli.rest, vec!["now", "--whatever"]);
    }

    #[test]
    fn unknown_deescalation_is_a_parse_error() {
        let result = Cli::try_parse_from(["picostack", "--deescalation", "su", "start"]);
        assert!(result.is_err());
    }
}
