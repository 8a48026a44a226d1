// config.rs - vigil.toml loading and command-line overrides.
//
// Resolution order: built-in defaults, then the config file, then flags.
// A missing file at the default location is fine; a file the user named
// explicitly must exist and parse.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use serde::{Deserialize, Serialize};
use vigil_monitor::BusKind;
use vigil_notify::NotifierSettings;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vigil/vigil.toml";

/// Contents of `vigil.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Enabled notifiers, in dispatch order.
    #[serde(default)]
    pub notifiers: Vec<String>,

    /// Units to monitor by name (e.g. `sshd.service`).
    #[serde(default)]
    pub units: Vec<String>,

    /// Monitor every unit the service manager knows about.
    #[serde(default)]
    pub all_units: bool,

    #[serde(default)]
    pub bus: BusKind,

    /// Per-notifier settings (`[notifier.irc]` and so on).
    #[serde(default)]
    pub notifier: NotifierSettings,
}

/// What `watch` monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSelection {
    Named(Vec<String>),
    All,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if it exists.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply notifier flags on top of the file values.
    pub fn apply_notifier_args(&mut self, args: &NotifierArgs) {
        if !args.notifiers.is_empty() {
            self.notifiers = args.notifiers.clone();
        }

        let n = &mut self.notifier;
        set(&mut n.logging.level, &args.logging_level);
        set(&mut n.jsonl.path, &args.jsonl_path);

        set_opt(&mut n.irc.server, &args.irc_server);
        set(&mut n.irc.port, &args.irc_port);
        set(&mut n.irc.nick, &args.irc_nick);
        set_opt(&mut n.irc.channel, &args.irc_channel);

        set_opt(&mut n.smtp.host, &args.smtp_host);
        set_opt(&mut n.smtp.port, &args.smtp_port);
        set_opt(&mut n.smtp.from, &args.smtp_from);
        set_opt(&mut n.smtp.to, &args.smtp_to);

        set_opt(&mut n.esmtp.host, &args.esmtp_host);
        set_opt(&mut n.esmtp.port, &args.esmtp_port);
        set_opt(&mut n.esmtp.from, &args.esmtp_from);
        set_opt(&mut n.esmtp.to, &args.esmtp_to);
        set_opt(&mut n.esmtp.user, &args.esmtp_user);
        set_opt(&mut n.esmtp.password, &args.esmtp_password);
    }

    /// Apply unit selection flags. Either flag replaces the file's choice
    /// entirely.
    pub fn apply_unit_args(&mut self, units: &[String], all_units: bool, user: bool) {
        if all_units {
            self.all_units = true;
            self.units.clear();
        } else if !units.is_empty() {
            self.all_units = false;
            self.units = units.to_vec();
        }
        if user {
            self.bus = BusKind::User;
        }
    }

    /// The effective unit selection.
    pub fn unit_selection(&self) -> anyhow::Result<UnitSelection> {
        match (self.all_units, self.units.is_empty()) {
            (true, false) => bail!("`units` and `all_units` are mutually exclusive"),
            (true, true) => Ok(UnitSelection::All),
            (false, false) => Ok(UnitSelection::Named(self.units.clone())),
            (false, true) => bail!("nothing to monitor: pass --unit or --all-units"),
        }
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

/// Notifier selection and per-notifier flags, shared by `watch` and `test`.
#[derive(Debug, Clone, Default, Args)]
pub struct NotifierArgs {
    /// Notifier to enable (repeatable; replaces the configured list).
    #[arg(long = "notifier", value_name = "NAME")]
    pub notifiers: Vec<String>,

    /// Level the logging notifier reports events at.
    #[arg(long, value_name = "LEVEL")]
    pub logging_level: Option<String>,

    /// File the jsonl notifier appends to.
    #[arg(long, value_name = "PATH")]
    pub jsonl_path: Option<PathBuf>,

    /// IRC server address.
    #[arg(long, value_name = "HOST")]
    pub irc_server: Option<String>,

    /// IRC server port.
    #[arg(long, value_name = "PORT")]
    pub irc_port: Option<u16>,

    /// Nick for the bot.
    #[arg(long, value_name = "NICK")]
    pub irc_nick: Option<String>,

    /// Channel for the bot to join.
    #[arg(long, value_name = "CHANNEL")]
    pub irc_channel: Option<String>,

    #[arg(long, value_name = "HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub smtp_port: Option<u16>,

    #[arg(long, value_name = "ADDRESS")]
    pub smtp_from: Option<String>,

    #[arg(long, value_name = "ADDRESS")]
    pub smtp_to: Option<String>,

    #[arg(long, value_name = "HOST")]
    pub esmtp_host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub esmtp_port: Option<u16>,

    #[arg(long, value_name = "ADDRESS")]
    pub esmtp_from: Option<String>,

    #[arg(long, value_name = "ADDRESS")]
    pub esmtp_to: Option<String>,

    #[arg(long, value_name = "USER")]
    pub esmtp_user: Option<String>,

    /// Prefer the config file: command lines are visible to other users.
    #[arg(long, value_name = "PASSWORD")]
    pub esmtp_password: Option<String>,
}
