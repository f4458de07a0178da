use bon::Builder;
use chrono::NaiveDate;

use crate::{
    core::{
        mask::DayMask,
        policy::PlanPolicy,
        series::PriceSeries,
        snapshot::{BuySwitchMode, PlanSnapshot},
    },
    error::PlanError,
};

/// Mask group given either directly or as prices to encode.
#[derive(Clone, Debug, PartialEq)]
pub enum MaskInput {
    Masks(DayMask),
    Prices(PriceSeries),
}

impl MaskInput {
    /// Explicit mask words take precedence over the prices, empty inputs mean «not given».
    pub fn from_args(masks: &[u16], prices: Vec<f64>) -> Result<Option<Self>, PlanError> {
        if !masks.is_empty() {
            return Ok(Some(Self::Masks(DayMask::try_from(masks)?)));
        }
        if !prices.is_empty() {
            return Ok(Some(Self::Prices(prices.into())));
        }
        Ok(None)
    }

    pub fn resolve(&self, policy: PlanPolicy) -> DayMask {
        match self {
            Self::Masks(mask) => *mask,
            Self::Prices(series) => series.encode(policy),
        }
    }
}

/// Plan fields to write right away.
#[must_use]
#[derive(Clone, Debug, Default, Builder)]
pub struct ImmediatePlan {
    pub enable: Option<bool>,
    pub buy_switch_mode: Option<BuySwitchMode>,
    pub sell_today: Option<MaskInput>,
    pub sell_tomorrow: Option<MaskInput>,
    pub buy_today: Option<MaskInput>,
    pub buy_tomorrow: Option<MaskInput>,

    #[builder(default)]
    pub sell_policy: PlanPolicy,

    #[builder(default)]
    pub buy_policy: PlanPolicy,
}

impl ImmediatePlan {
    pub fn to_snapshot(&self, today: NaiveDate) -> PlanSnapshot {
        let sell = |input: &MaskInput| input.resolve(self.sell_policy);
        let buy = |input: &MaskInput| input.resolve(self.buy_policy);
        PlanSnapshot {
            date: today,
            enable: self.enable,
            sell_today: self.sell_today.as_ref().map(sell),
            sell_tomorrow: self.sell_tomorrow.as_ref().map(sell),
            buy_switch_mode: self.buy_switch_mode,
            buy_today: self.buy_today.as_ref().map(buy),
            buy_tomorrow: self.buy_tomorrow.as_ref().map(buy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::Granularity;

    #[test]
    fn test_masks_take_precedence_ok() -> Result<(), PlanError> {
        let input = MaskInput::from_args(&[1, 2, 3, 4, 5, 6], vec![-1.0; 24])?;
        assert_eq!(input, Some(MaskInput::Masks(DayMask::from([1, 2, 3, 4, 5, 6]))));
        Ok(())
    }

    #[test]
    fn test_empty_inputs_ok() -> Result<(), PlanError> {
        assert_eq!(MaskInput::from_args(&[], Vec::new())?, None);
        Ok(())
    }

    #[test]
    fn test_wrong_mask_length() {
        let result = MaskInput::from_args(&[1, 2, 3], Vec::new());
        assert!(matches!(result, Err(PlanError::InvalidMaskLength(3))));
    }

    #[test]
    fn test_to_snapshot_ok() -> Result<(), PlanError> {
        let plan = ImmediatePlan::builder()
            .enable(true)
            .maybe_sell_today(MaskInput::from_args(&[], vec![5.0, 15.0])?)
            .maybe_buy_tomorrow(MaskInput::from_args(&[], vec![15.0])?)
            .sell_policy(PlanPolicy {
                threshold: 10.0,
                invert: false,
                granularity: Granularity::Hourly,
            })
            .buy_policy(PlanPolicy {
                threshold: 10.0,
                invert: true,
                granularity: Granularity::Quarterly,
            })
            .build();
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let snapshot = plan.to_snapshot(today);
        assert_eq!(snapshot.date, today);
        assert_eq!(snapshot.enable, Some(true));
        assert_eq!(snapshot.sell_today.map(|mask| mask.words()[0]), Some(0xFF0F));
        assert_eq!(snapshot.buy_tomorrow.map(|mask| mask.words()[0]), Some(0x0001));
        assert_eq!(snapshot.sell_tomorrow, None);
        assert_eq!(snapshot.buy_today, None);
        assert_eq!(snapshot.buy_switch_mode, None);
        Ok(())
    }
}
