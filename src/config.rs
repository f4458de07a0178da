use chrono::NaiveDate;
use enumset::{EnumSet, EnumSetType, enum_set};
use serde::Deserialize;

use crate::{
    core::{
        day::Day,
        policy::PlanPolicy,
        series::PriceSeries,
        snapshot::{BuySwitchMode, PlanSnapshot},
    },
    source::PriceSource,
};

/// Device capability.
#[derive(Debug, EnumSetType, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// The negative price plan is enabled on the device.
    Plan,

    /// Automatically fetch tomorrow's prices in the afternoon.
    AutoUpdate,
}

impl Feature {
    pub const DEFAULT: EnumSet<Self> = enum_set!(Self::Plan | Self::AutoUpdate);
}

/// Plan configuration of a single device.
pub struct DevicePlanConfig {
    pub source: PriceSource,
    pub sell: PlanPolicy,
    pub buy: PlanPolicy,
    pub buy_switch_mode: BuySwitchMode,
    pub features: EnumSet<Feature>,
}

impl DevicePlanConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.features.contains(Feature::Plan)
    }

    /// Whether the device should be picked up by the auto-update.
    #[must_use]
    pub fn is_auto_updated(&self) -> bool {
        self.features.contains(Feature::AutoUpdate) && self.source.is_remote_api()
    }

    /// Build the partial snapshot for one fetched day.
    ///
    /// Buy registers, including the switch, are only touched when buying is enabled.
    pub fn snapshot(&self, today: NaiveDate, day: Day, series: &PriceSeries) -> PlanSnapshot {
        let sell = Some(series.encode(self.sell));
        let buy_switch_mode = self.buy_switch_mode.is_enabled().then_some(self.buy_switch_mode);
        let buy = buy_switch_mode.map(|_| series.encode(self.buy));
        let mut snapshot = PlanSnapshot::new(today);
        snapshot.buy_switch_mode = buy_switch_mode;
        match day {
            Day::Today => {
                snapshot.sell_today = sell;
                snapshot.buy_today = buy;
            }
            Day::Tomorrow => {
                snapshot.sell_tomorrow = sell;
                snapshot.buy_tomorrow = buy;
            }
        }
        snapshot
    }
}
