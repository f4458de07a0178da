use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use bon::Builder;
use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::{core::mask::DayMask, error::PlanError};

/// Whether the inverter may buy from the grid during the favourable slots.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "u16")]
pub enum BuySwitchMode {
    #[default]
    Disabled = 0,

    /// Charge the battery from the grid.
    ChargeOnly = 1,

    /// Charge the battery and also sell at positive prices.
    ChargeAndSell = 2,
}

impl BuySwitchMode {
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<BuySwitchMode> for u16 {
    fn from(mode: BuySwitchMode) -> Self {
        mode as Self
    }
}

impl TryFrom<u16> for BuySwitchMode {
    type Error = PlanError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::ChargeOnly),
            2 => Ok(Self::ChargeAndSell),
            _ => Err(PlanError::InvalidBuySwitchMode(value)),
        }
    }
}

impl FromStr for BuySwitchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "charge-only" => Ok(Self::ChargeOnly),
            "charge-and-sell" => Ok(Self::ChargeAndSell),
            _ => Ok(Self::try_from(s.parse::<u16>()?)?),
        }
    }
}

impl Display for BuySwitchMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::ChargeOnly => write!(f, "charge-only"),
            Self::ChargeAndSell => write!(f, "charge-and-sell"),
        }
    }
}

/// Partial plan for the device.
///
/// Absent fields leave the corresponding registers untouched.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct PlanSnapshot {
    /// Local date of «today».
    pub date: NaiveDate,

    pub enable: Option<bool>,
    pub sell_today: Option<DayMask>,
    pub sell_tomorrow: Option<DayMask>,
    pub buy_switch_mode: Option<BuySwitchMode>,
    pub buy_today: Option<DayMask>,
    pub buy_tomorrow: Option<DayMask>,
}

impl PlanSnapshot {
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            enable: None,
            sell_today: None,
            sell_tomorrow: None,
            buy_switch_mode: None,
            buy_today: None,
            buy_tomorrow: None,
        }
    }

    #[must_use]
    pub fn tomorrow(&self) -> NaiveDate {
        self.date + Days::new(1)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enable.is_none()
            && self.sell_today.is_none()
            && self.sell_tomorrow.is_none()
            && self.buy_switch_mode.is_none()
            && self.buy_today.is_none()
            && self.buy_tomorrow.is_none()
    }
}
