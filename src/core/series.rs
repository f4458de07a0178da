use std::iter::{repeat, repeat_n};

use crate::core::{
    mask::{DayMask, SLOTS_PER_DAY},
    policy::PlanPolicy,
};

/// Day prices in the chronological order, at the policy granularity.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, derive_more::From, derive_more::Into, derive_more::Deref)]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    /// Repeat one price for the entire day.
    pub fn flat(price: f64) -> Self {
        Self(vec![price; SLOTS_PER_DAY])
    }

    /// Build the day mask.
    ///
    /// Each price is expanded to its quarter-hour slots, the day is padded with zero prices
    /// or truncated to 96 slots.
    pub fn encode(&self, policy: PlanPolicy) -> DayMask {
        self.0
            .iter()
            .flat_map(|price| repeat_n(*price, policy.granularity.n_slots()))
            .chain(repeat(0.0))
            .take(SLOTS_PER_DAY)
            .map(|price| (price < policy.threshold) != policy.invert)
            .collect()
    }
}

impl FromIterator<f64> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
