use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::PlanError;

/// Rules turning prices into a day mask.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct PlanPolicy {
    /// Slots priced strictly below the threshold are set.
    #[serde(default)]
    pub threshold: f64,

    /// Flip all the bits after the comparison.
    #[serde(default)]
    pub invert: bool,

    /// Duration covered by one input price.
    #[serde(default)]
    pub granularity: Granularity,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self { threshold: 0.0, invert: false, granularity: Granularity::default() }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "u16")]
pub enum Granularity {
    Quarterly,
    HalfHourly,

    #[default]
    Hourly,
}

impl Granularity {
    pub const fn minutes(self) -> u16 {
        match self {
            Self::Quarterly => 15,
            Self::HalfHourly => 30,
            Self::Hourly => 60,
        }
    }

    /// Number of quarter-hour slots covered by one price.
    pub const fn n_slots(self) -> usize {
        let n_slots = (self.minutes() / 15) as usize;
        if n_slots == 0 { 1 } else { n_slots }
    }
}

impl TryFrom<u16> for Granularity {
    type Error = PlanError;

    fn try_from(minutes: u16) -> Result<Self, Self::Error> {
        match minutes {
            15 => Ok(Self::Quarterly),
            30 => Ok(Self::HalfHourly),
            60 => Ok(Self::Hourly),
            _ => Err(PlanError::InvalidGranularity(minutes)),
        }
    }
}

impl FromStr for Granularity {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s
            .trim()
            .trim_end_matches("min")
            .parse::<u16>()
            .map_err(|source| PlanError::MalformedGranularity { text: s.to_owned(), source })?;
        Self::try_from(minutes)
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}min", self.minutes())
    }
}
