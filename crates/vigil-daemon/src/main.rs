//! # vigil
//!
//! Watches systemd units and reports their lifecycle events (normal starts
//! and stops, failures, recoveries) to IRC, e-mail and logs.
//!
//! - `vigil watch --unit sshd.service --notifier irc` - monitor named units
//! - `vigil watch --all-units` - monitor every loaded unit
//! - `vigil test --unit sshd.service` - send test notifications
//! - `vigil notifiers` - list available notifiers
//!
//! Settings come from `/etc/vigil/vigil.toml` (or `--config`), overridden
//! by command-line flags.

mod commands;
mod config;
mod logging;
mod systemd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DaemonConfig;
use crate::logging::LogFormat;

/// Monitor systemd unit states.
#[derive(Parser)]
#[command(name = "vigil", version, about)]
struct Cli {
    /// Config file (defaults to /etc/vigil/vigil.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Be more verbose.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Diagnostic log format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor units and dispatch lifecycle events.
    Watch(commands::watch::WatchArgs),
    /// Send test notifications for units without touching the bus.
    Test(commands::test::TestArgs),
    /// List available notifiers.
    Notifiers,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format)?;

    match &cli.command {
        Commands::Watch(args) => {
            let config = DaemonConfig::resolve(cli.config.as_deref())?;
            commands::watch::execute(args, config).await
        }
        Commands::Test(args) => {
            let config = DaemonConfig::resolve(cli.config.as_deref())?;
            commands::test::execute(args, config).await
        }
        Commands::Notifiers => commands::notifiers::execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use vigil_state::UnitState;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_flags() {
        let cli = Cli::try_parse_from([
            "vigil",
            "watch",
            "--unit",
            "sshd.service",
            "--unit",
            "cron.service",
            "--notifier",
            "irc",
            "--irc-server",
            "irc.example.org",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.units, vec!["sshd.service", "cron.service"]);
                assert_eq!(args.notifier.notifiers, vec!["irc"]);
                assert_eq!(args.notifier.irc_server.as_deref(), Some("irc.example.org"));
                assert!(!args.all_units);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn unit_and_all_units_conflict() {
        assert!(
            Cli::try_parse_from(["vigil", "watch", "--unit", "a.service", "--all-units"]).is_err()
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vigil", "test", "--unit", "a.service"]).unwrap();
        match cli.command {
            Commands::Test(args) => {
                assert_eq!(args.from, UnitState::Failed);
                assert_eq!(args.to, "active");
                assert_eq!(args.linger_secs, 2);
            }
            _ => panic!("expected test"),
        }
    }

    #[test]
    fn test_requires_a_unit_and_a_known_state() {
        assert!(Cli::try_parse_from(["vigil", "test"]).is_err());
        assert!(
            Cli::try_parse_from(["vigil", "test", "--unit", "a", "--from", "sleeping"]).is_err()
        );
    }

    #[test]
    fn json_log_format() {
        let cli = Cli::try_parse_from(["vigil", "--log-format", "json", "notifiers"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
