mod immediate;

use chrono::NaiveDate;

pub use self::immediate::{ImmediatePlan, MaskInput};
use crate::{
    config::DevicePlanConfig,
    core::{day::Day, series::PriceSeries},
    error::PlanError,
    prelude::*,
    registry::{Device, DeviceId, Registry},
    writer,
};

/// Outcome of one update attempt, the days are independent.
#[must_use]
#[derive(Debug)]
pub struct UpdateReport {
    pub today: Result<usize, PlanError>,
    pub tomorrow: Result<usize, PlanError>,
}

/// Entry point for the callers: configuration, immediate writes, and price updates.
#[derive(Default)]
pub struct Planner {
    registry: Registry,
}

impl Planner {
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn configure(&self, id: &DeviceId, config: DevicePlanConfig) -> Result<(), PlanError> {
        self.registry.configure(id, config)
    }

    /// Write the caller-supplied plan right away.
    ///
    /// The device does not have to be configured.
    #[instrument(skip_all, fields(device_id = %id, today = %today))]
    pub async fn apply_immediate(
        &self,
        id: &DeviceId,
        plan: &ImmediatePlan,
        today: NaiveDate,
    ) -> Result<usize, PlanError> {
        let device = self.registry.get(id)?;
        match device.config() {
            Ok(config) if config.is_enabled() => {}
            _ => warn!("the plan feature is not enabled for the device, writing anyway"),
        }
        let snapshot = plan.to_snapshot(today);
        let _guard = device.lock_plan().await;
        writer::apply(device.target(), &snapshot).await
    }

    /// Run one update attempt for the device, or for every configured device.
    #[instrument(skip_all, fields(today = %today))]
    pub async fn trigger_update(
        &self,
        id: Option<&DeviceId>,
        today: NaiveDate,
    ) -> Result<Vec<(DeviceId, UpdateReport)>, PlanError> {
        let devices = match id {
            Some(id) => {
                let device = self.registry.get(id)?;
                let config = device.config()?;
                vec![(device, config)]
            }
            None => self
                .registry
                .devices()
                .into_iter()
                .filter_map(|device| {
                    let config = device.config().ok()?;
                    Some((device, config))
                })
                .collect(),
        };
        let mut reports = Vec::with_capacity(devices.len());
        for (device, config) in devices {
            let report = Self::update(&device, &config, today).await;
            reports.push((device.id().clone(), report));
        }
        Ok(reports)
    }

    /// Fetch today's and tomorrow's prices and write each available day.
    ///
    /// Fetching happens before taking the device lock.
    #[instrument(skip_all, fields(device_id = %device.id()))]
    pub async fn update(
        device: &Device,
        config: &DevicePlanConfig,
        today: NaiveDate,
    ) -> UpdateReport {
        let today_series = config.source.fetch(today, Day::Today).await;
        let tomorrow_series = config.source.fetch(today, Day::Tomorrow).await;

        let guard = device.lock_plan().await;
        let report = UpdateReport {
            today: Self::write_day(device, config, today, Day::Today, today_series).await,
            tomorrow: Self::write_day(device, config, today, Day::Tomorrow, tomorrow_series).await,
        };
        drop(guard);

        for (day, result) in [(Day::Today, &report.today), (Day::Tomorrow, &report.tomorrow)] {
            match result {
                Ok(n_writes) => info!(%day, n_writes, "updated"),
                Err(error) if error.is_unavailable() => {
                    info!(%day, "not yet available: {error:#}");
                }
                Err(error) => warn!(%day, "failed to update: {error:#}"),
            }
        }
        report
    }

    async fn write_day(
        device: &Device,
        config: &DevicePlanConfig,
        today: NaiveDate,
        day: Day,
        series: Result<PriceSeries, PlanError>,
    ) -> Result<usize, PlanError> {
        let snapshot = config.snapshot(today, day, &series?);
        writer::apply(device.target(), &snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        config::Feature,
        core::{
            mask::DayMask,
            policy::PlanPolicy,
            registers::{MaskGroup, Register},
            snapshot::BuySwitchMode,
        },
        registry::tests::entity_config,
        source::{EntitySource, PriceSource},
        target::InverterRegisterTarget,
        testing::{MemoryTarget, StaticObservations},
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    fn planner_with(target: MemoryTarget) -> (Planner, Arc<MemoryTarget>) {
        let target = Arc::new(target);
        let planner = Planner::default();
        planner.registry().register(Device::new("inverter".into(), target.clone()));
        (planner, target)
    }

    fn observed_config(attributes: serde_json::Value, mode: BuySwitchMode) -> DevicePlanConfig {
        let observations =
            StaticObservations::default().with("sensor.prices", "0.2", attributes);
        DevicePlanConfig {
            source: PriceSource::Entity(
                EntitySource::builder()
                    .observations(Arc::new(observations))
                    .entity_id("sensor.prices")
                    .build(),
            ),
            sell: PlanPolicy::default(),
            buy: PlanPolicy { invert: true, ..PlanPolicy::default() },
            buy_switch_mode: mode,
            features: Feature::DEFAULT,
        }
    }

    #[tokio::test]
    async fn test_apply_immediate_sell_today_only_ok() -> Result<(), PlanError> {
        let (planner, target) = planner_with(MemoryTarget::default());
        let plan = ImmediatePlan::builder()
            .sell_today(MaskInput::Masks(DayMask::from([0xFFFF, 0, 0, 0, 0, 1])))
            .build();
        let n_writes = planner.apply_immediate(&"inverter".into(), &plan, today()).await?;
        assert_eq!(n_writes, 7);
        assert_eq!(target.n_writes(), 7);
        assert_eq!(target.get(Register::TodayDate), Some(0x080F));
        assert_eq!(target.get(Register::BuySwitch), None);
        assert!(MaskGroup::BuyToday.registers().all(|register| target.get(register).is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_immediate_unknown_device() {
        let (planner, target) = planner_with(MemoryTarget::default());
        let plan = ImmediatePlan::builder().enable(true).build();
        let result = planner.apply_immediate(&"other".into(), &plan, today()).await;
        assert!(matches!(result, Err(PlanError::DeviceNotFound(_))));
        assert_eq!(target.n_writes(), 0);
    }

    #[tokio::test]
    async fn test_apply_immediate_without_feature_ok() -> Result<(), PlanError> {
        let (planner, target) = planner_with(MemoryTarget::default());
        planner.configure(&"inverter".into(), entity_config(enumset::EnumSet::empty()))?;
        let plan = ImmediatePlan::builder().enable(false).build();
        planner.apply_immediate(&"inverter".into(), &plan, today()).await?;
        assert_eq!(target.get(Register::Enable), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_update_unconfigured_device() {
        let (planner, _) = planner_with(MemoryTarget::default());
        let result = planner.trigger_update(Some(&"inverter".into()), today()).await;
        assert!(matches!(result, Err(PlanError::ConfigurationMissing(_))));
    }

    #[tokio::test]
    async fn test_trigger_update_both_days_ok() -> Result {
        let (planner, target) = planner_with(MemoryTarget::default());
        let attributes = json!({ "raw_today": [-1.0, 1.0], "raw_tomorrow": [1.0, -1.0] });
        let config = observed_config(attributes, BuySwitchMode::ChargeOnly);
        planner.configure(&"inverter".into(), config)?;

        let reports = planner.trigger_update(None, today()).await?;
        assert_eq!(reports.len(), 1);
        let (id, report) = &reports[0];
        assert_eq!(id.to_string(), "inverter");
        assert!(matches!(report.today, Ok(14)));
        assert!(matches!(report.tomorrow, Ok(14)));

        assert_eq!(target.read_mask(MaskGroup::SellToday).await?.words()[0], 0x000F);
        assert_eq!(target.read_mask(MaskGroup::SellTomorrow).await?.words()[0], 0x00F0);
        assert_eq!(target.read_mask(MaskGroup::BuyToday).await?.words()[0], 0xFFF0);
        assert_eq!(target.get(Register::BuySwitch), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_update_tomorrow_unavailable_ok() -> Result {
        let (planner, target) = planner_with(MemoryTarget::default());
        let attributes = json!({ "raw_today": [-1.0] });
        let config = observed_config(attributes, BuySwitchMode::Disabled);
        planner.configure(&"inverter".into(), config)?;

        let reports = planner.trigger_update(Some(&"inverter".into()), today()).await?;
        let (_, report) = &reports[0];
        assert!(matches!(report.today, Ok(7)));
        assert!(matches!(report.tomorrow, Err(PlanError::SourceUnavailable { .. })));
        assert_eq!(target.get(Register::TomorrowDate), None);
        assert_eq!(target.get(Register::BuySwitch), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_update_skips_unconfigured_ok() -> Result {
        let (planner, _) = planner_with(MemoryTarget::default());
        let spare = Device::new("spare".into(), Arc::new(MemoryTarget::default()));
        planner.registry().register(spare);
        let attributes = json!({ "raw_today": [1.0], "raw_tomorrow": [1.0] });
        let config = observed_config(attributes, BuySwitchMode::Disabled);
        planner.configure(&"inverter".into(), config)?;
        let reports = planner.trigger_update(None, today()).await?;
        assert_eq!(reports.len(), 1);
        Ok(())
    }
}
