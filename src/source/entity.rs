use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    core::{day::Day, series::PriceSeries},
    error::PlanError,
    prelude::*,
};

/// Current state of a named observation.
#[derive(Clone, Debug, Deserialize)]
pub struct Observation {
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Observation {
    /// Whether the observation is known but carries no data.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self.state.as_str(), "unavailable" | "unknown")
    }
}

#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Returns [`None`] when the observation does not exist.
    async fn get_observation(&self, entity_id: &str) -> Result<Option<Observation>>;
}

/// Prices taken from the observation attributes.
#[derive(Builder)]
pub struct EntitySource {
    observations: Arc<dyn ObservationSource>,

    #[builder(into)]
    entity_id: String,

    #[builder(into, default = String::from("raw_today"))]
    today_attribute: String,

    #[builder(into, default = String::from("raw_tomorrow"))]
    tomorrow_attribute: String,
}

impl EntitySource {
    /// Keys of a price record, in the order of preference.
    const RECORD_KEYS: [&'static str; 3] = ["value", "price", "v"];

    #[instrument(skip_all, fields(entity_id = %self.entity_id))]
    pub async fn fetch(&self, today: NaiveDate, day: Day) -> Result<PriceSeries, PlanError> {
        let on = day.date(today);
        let unavailable = |reason: String| PlanError::SourceUnavailable { on, reason };

        let observation = self
            .observations
            .get_observation(&self.entity_id)
            .await
            .map_err(|error| unavailable(format!("{error:#}")))?
            .filter(|observation| !observation.is_unavailable())
            .ok_or_else(|| unavailable(format!("`{}` is not available", self.entity_id)))?;

        let attribute = match day {
            Day::Today => &self.today_attribute,
            Day::Tomorrow => &self.tomorrow_attribute,
        };
        let series = match observation.attributes.get(attribute) {
            Some(value) => Self::extract(value),
            // The state is today's price:
            None if day == Day::Today => {
                Self::parse_price(&Value::String(observation.state.clone()))
            }
            None => None,
        };
        series.ok_or_else(|| unavailable(format!("`{attribute}` has no numeric data")))
    }

    /// Extract the prices from an attribute value.
    ///
    /// Accepts a list of records, a list of numbers, or a single number for the entire day.
    fn extract(value: &Value) -> Option<PriceSeries> {
        match value {
            Value::Array(items) => {
                let series: PriceSeries = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(record) => Self::RECORD_KEYS
                            .iter()
                            .find_map(|key| record.get(*key))
                            .and_then(Self::as_price),
                        _ => Self::as_price(item),
                    })
                    .collect();
                (!series.is_empty()).then_some(series)
            }
            _ => Self::parse_price(value),
        }
    }

    fn parse_price(value: &Value) -> Option<PriceSeries> {
        Self::as_price(value).map(PriceSeries::flat)
    }

    fn as_price(value: &Value) -> Option<f64> {
        let price: f64 = match value {
            Value::Number(number) => number.as_f64()?,
            Value::String(string) => string.trim().parse().ok()?,
            _ => return None,
        };
        price.is_finite().then_some(price)
    }
}
