use std::sync::Arc;

use chrono::{NaiveTime, TimeDelta};
use clap::Parser;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::{
    api::heartbeat::Heartbeat,
    cli::devices::DevicesArgs,
    prelude::*,
    scheduler::{
        AutoUpdateScheduler,
        RolloverScheduler,
        timing::{Daily, Window},
    },
};

#[derive(Parser)]
pub struct RunArgs {
    #[clap(flatten)]
    devices: DevicesArgs,

    /// Local time to promote tomorrow's plan to today.
    #[clap(long, env = "ROLLOVER_AT", default_value = "00:00:30")]
    rollover_at: NaiveTime,

    /// First auto-update attempt of the day.
    #[clap(long, env = "UPDATE_FROM", default_value = "14:30:00")]
    update_from: NaiveTime,

    /// Last auto-update attempt of the day.
    #[clap(long, env = "UPDATE_UNTIL", default_value = "23:30:00")]
    update_until: NaiveTime,

    #[clap(long, env = "UPDATE_EVERY", default_value = "30min")]
    update_every: humantime::Duration,

    #[clap(flatten)]
    heartbeat: Heartbeat,
}

impl RunArgs {
    pub async fn run(self) -> Result {
        let period = TimeDelta::from_std(self.update_every.into())?;
        let window = Window::new(self.update_from, self.update_until, period)?;
        let planner = Arc::new(self.devices.load(None).await?);
        ensure!(!planner.registry().devices().is_empty(), "no devices are connected");

        let rollover = RolloverScheduler::new(Arc::clone(&planner), Daily(self.rollover_at));
        let auto_update = AutoUpdateScheduler::new(planner, window);
        tokio::select! {
            () = rollover.run(&self.heartbeat) => {}
            () = auto_update.run(&self.heartbeat) => {}
            result = wait_for_shutdown() => result?,
        }
        info!("shutting down…");
        Ok(())
    }
}

async fn wait_for_shutdown() -> Result {
    let ctrl_c = async { tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C") };

    #[cfg(unix)]
    let terminate = async {
        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install the signal handler")?;
        terminate.recv().await;
        Ok::<_, Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result>();

    tokio::select! {
        result = ctrl_c => result?,
        result = terminate => result?,
    }
    info!("received the shutdown signal");
    Ok(())
}
