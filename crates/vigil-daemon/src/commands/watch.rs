// watch.rs - `vigil watch`: monitor units until the bus goes away or a
// shutdown signal arrives.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;
use tokio::signal::unix::{signal, SignalKind};
use vigil_monitor::{DbusConnector, Monitor};

use crate::config::{DaemonConfig, NotifierArgs, UnitSelection};
use crate::systemd;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// A unit to monitor, e.g. sshd.service (repeatable).
    #[arg(long = "unit", value_name = "NAME", conflicts_with = "all_units")]
    pub units: Vec<String>,

    /// Monitor all units.
    #[arg(long)]
    pub all_units: bool,

    /// Watch the user service manager instead of the system one.
    #[arg(long)]
    pub user: bool,

    /// Start even if the host does not appear to run systemd.
    #[arg(long)]
    pub skip_systemd_check: bool,

    #[command(flatten)]
    pub notifier: NotifierArgs,
}

pub async fn execute(args: &WatchArgs, mut config: DaemonConfig) -> anyhow::Result<()> {
    config.apply_notifier_args(&args.notifier);
    config.apply_unit_args(&args.units, args.all_units, args.user);

    if !args.skip_systemd_check && !systemd::booted() {
        bail!(
            "this system doesn't run systemd ({} not found)",
            systemd::SYSTEMD_RUNTIME_DIR
        );
    }
    let selection = config.unit_selection()?;

    systemd::status("Discovering units");
    let registry = super::build_registry(&config)?;
    let mut monitor = Monitor::new(Arc::new(registry));

    let mut bus = DbusConnector::connect(config.bus)
        .await
        .context("failed to subscribe to unit state changes")?;

    match selection {
        UnitSelection::All => {
            monitor = monitor.follow_new_units(true);
            monitor
                .watch_all(&mut bus)
                .await
                .context("failed to enumerate units")?;
        }
        UnitSelection::Named(names) => {
            monitor.watch_names(names.as_slice());
        }
    }

    systemd::ready();
    systemd::status(&format!("Monitoring {} units.", monitor.len()));
    tracing::info!(
        units = monitor.len(),
        notifiers = ?monitor.registry().names(),
        bus = %config.bus,
        "monitoring started"
    );

    tokio::select! {
        result = monitor.run(&mut bus) => {
            result.context("monitoring stopped")?;
        }
        received = shutdown_signal() => {
            let name = received.context("failed to install signal handlers")?;
            tracing::info!(signal = name, "shutting down");
        }
    }

    systemd::stopping();
    Ok(())
}

/// Resolve on SIGINT or SIGTERM, yielding the signal's name.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}
