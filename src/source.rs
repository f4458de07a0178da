pub mod entity;
pub mod remote;

use chrono::NaiveDate;

pub use self::{entity::EntitySource, remote::RemoteApiSource};
use crate::{
    core::{day::Day, series::PriceSeries},
    error::PlanError,
    prelude::*,
};

/// Provider of the day prices.
pub enum PriceSource {
    /// Prices from an observation attribute.
    Entity(EntitySource),

    /// Day-ahead prices fetched over HTTP.
    RemoteApi(RemoteApiSource),
}

impl PriceSource {
    #[must_use]
    pub const fn is_remote_api(&self) -> bool {
        matches!(self, Self::RemoteApi(_))
    }

    /// Fetch the prices for the day relative to `today`.
    ///
    /// Only [`PlanError::SourceUnavailable`] and [`PlanError::MalformedPriceData`] are returned.
    #[instrument(skip_all, fields(day = %day))]
    pub async fn fetch(&self, today: NaiveDate, day: Day) -> Result<PriceSeries, PlanError> {
        let series = match self {
            Self::Entity(source) => source.fetch(today, day).await?,
            Self::RemoteApi(source) => source.fetch(today, day).await?,
        };
        debug!(n_prices = series.len(), "fetched");
        Ok(series)
    }
}
