use std::{collections::HashMap, time::Duration};

use chrono::{Days, NaiveDate, NaiveDateTime};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::prelude::*;

/// Energi Data Service day-ahead prices.
pub struct Api {
    client: reqwest::Client,
    base_url: Url,
}

impl Api {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.energidataservice.dk";

    const TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(base_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    /// Fetch the raw response body for the day.
    #[instrument(skip_all, fields(on = %on, price_area = price_area))]
    pub async fn get_day(&self, on: NaiveDate, price_area: &str) -> Result<String> {
        info!("fetching…");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .push("dataset")
            .push("DayAheadPrices");
        url.query_pairs_mut()
            .append_pair("start", &on.to_string())
            .append_pair("end", &(on + Days::new(1)).to_string())
            .append_pair("filter", &serde_json::json!({ "PriceArea": [price_area] }).to_string());
        let body = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to request the day-ahead prices")?
            .error_for_status()?
            .text()
            .await
            .context("failed to read the day-ahead prices")?;
        debug!(n_bytes = body.len(), "fetched");
        Ok(body)
    }
}

/// Parse the response body into the prices of the day, in the chronological order.
///
/// Records outside the day and records without the price are skipped.
pub fn parse_prices(body: &str, on: NaiveDate, column: &str) -> Result<Vec<f64>> {
    let mut records: Vec<(NaiveDateTime, f64)> = serde_json::from_str::<Response>(body)
        .context("failed to deserialize the day-ahead prices")?
        .records
        .into_iter()
        .filter(|record| record.time.date() == on)
        .filter_map(|record| Some((record.time, record.fields.get(column)?.as_f64()?)))
        .collect();
    records.sort_by_key(|(time, _)| *time);
    Ok(records.into_iter().map(|(_, price)| price).collect())
}

#[derive(Deserialize)]
struct Response {
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "TimeDK")]
    time: NaiveDateTime,

    #[serde(flatten)]
    fields: HashMap<String, Value>,
}
