use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;

use crate::{
    api::heartbeat::Heartbeat,
    core::{
        mask::DayMask,
        registers::{MaskGroup, Register},
        snapshot::{BuySwitchMode, PlanSnapshot},
    },
    error::PlanError,
    planner::Planner,
    prelude::*,
    registry::{Device, DeviceId},
    scheduler::timing::{Daily, sleep_until},
    writer,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RolloverOutcome {
    RolledOver { n_writes: usize },

    /// The device has no readable tomorrow's sell mask.
    Skipped,
}

/// Promotes «tomorrow» to «today» shortly after midnight.
pub struct RolloverScheduler {
    planner: Arc<Planner>,
    trigger: Daily,
    busy: Mutex<()>,
}

impl RolloverScheduler {
    pub fn new(planner: Arc<Planner>, trigger: Daily) -> Self {
        Self { planner, trigger, busy: Mutex::new(()) }
    }

    pub async fn run(&self, heartbeat: &Heartbeat) {
        info!(at = %self.trigger.0, "scheduled the rollover");
        loop {
            sleep_until(self.trigger.next_after(Local::now().naive_local())).await;
            if self.tick(Local::now().date_naive()).await.is_some() {
                heartbeat.send().await;
            }
        }
    }

    /// Roll over every enabled device.
    ///
    /// Returns [`None`] when the previous tick is still running.
    #[instrument(skip_all, fields(today = %today))]
    pub async fn tick(
        &self,
        today: NaiveDate,
    ) -> Option<Vec<(DeviceId, Result<RolloverOutcome, PlanError>)>> {
        let Ok(_busy) = self.busy.try_lock() else {
            warn!("the previous rollover is still running, skipping");
            return None;
        };
        let mut outcomes = Vec::new();
        for device in self.planner.registry().devices() {
            match device.config() {
                Ok(config) if config.is_enabled() => {}
                _ => {
                    debug!(device_id = %device.id(), "the plan is not enabled, skipping");
                    continue;
                }
            }
            let outcome = Self::roll_over(&device, today).await;
            match &outcome {
                Ok(RolloverOutcome::RolledOver { n_writes }) => {
                    info!(device_id = %device.id(), n_writes, "rolled over");
                }
                Ok(RolloverOutcome::Skipped) => info!(device_id = %device.id(), "skipped"),
                Err(error) => warn!(device_id = %device.id(), "failed to roll over: {error:#}"),
            }
            outcomes.push((device.id().clone(), outcome));
        }
        Some(outcomes)
    }

    /// Write tomorrow's masks as today's and clear tomorrow.
    ///
    /// The masks are read back from the device rather than re-fetched.
    #[instrument(skip_all, fields(device_id = %device.id()))]
    async fn roll_over(device: &Device, today: NaiveDate) -> Result<RolloverOutcome, PlanError> {
        let _guard = device.lock_plan().await;
        let target = device.target();

        let sell = match target.read_mask(MaskGroup::SellTomorrow).await {
            Ok(mask) => mask,
            Err(error) => {
                warn!("tomorrow's sell mask is not available, skipping: {error:#}");
                return Ok(RolloverOutcome::Skipped);
            }
        };

        let register = Register::BuySwitch;
        let buy_switch_mode = target
            .read_register(register)
            .await
            .map_err(|source| PlanError::RegisterReadFailed { register, source })?;
        let buy_switch_mode = BuySwitchMode::try_from(buy_switch_mode)
            .inspect_err(|error| warn!("{error}, leaving the buy registers untouched"))
            .ok()
            .filter(|mode| mode.is_enabled());

        let buy = if buy_switch_mode.is_some() {
            let mask = target.read_mask(MaskGroup::BuyTomorrow).await.unwrap_or_else(|error| {
                warn!("tomorrow's buy mask is not available, clearing: {error:#}");
                DayMask::ZERO
            });
            Some(mask)
        } else {
            None
        };

        let snapshot = PlanSnapshot {
            date: today,
            enable: None,
            sell_today: Some(sell),
            sell_tomorrow: Some(DayMask::ZERO),
            buy_switch_mode,
            buy_today: buy,
            buy_tomorrow: buy.map(|_| DayMask::ZERO),
        };
        let n_writes = writer::apply(target, &snapshot).await?;
        Ok(RolloverOutcome::RolledOver { n_writes })
    }
}
