use std::num::ParseIntError;

use chrono::NaiveDate;

use crate::{core::registers::Register, registry::DeviceId};

/// Plan failures the callers are expected to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// No price data could be obtained this cycle.
    #[error("no prices for {on}: {reason}")]
    SourceUnavailable { on: NaiveDate, reason: String },

    /// The source responded, but its payload could not be parsed.
    #[error("malformed prices for {on}: {reason}")]
    MalformedPriceData { on: NaiveDate, reason: String },

    #[error("failed to write `{register}`")]
    RegisterWriteFailed {
        register: Register,

        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read `{register}`")]
    RegisterReadFailed {
        register: Register,

        #[source]
        source: anyhow::Error,
    },

    #[error("device `{0}` is not registered")]
    DeviceNotFound(DeviceId),

    #[error("device `{0}` has no plan configuration")]
    ConfigurationMissing(DeviceId),

    #[error("expected 6 mask words, got {0}")]
    InvalidMaskLength(usize),

    #[error("buy switch mode must be 0, 1, or 2, got {0}")]
    InvalidBuySwitchMode(u16),

    #[error("granularity must be 15, 30, or 60 minutes, got {0}")]
    InvalidGranularity(u16),

    #[error("`{text}` is not a number of minutes")]
    MalformedGranularity {
        text: String,

        #[source]
        source: ParseIntError,
    },
}

impl PlanError {
    /// Whether the error only means «try again on the next attempt».
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::MalformedPriceData { .. })
    }
}
