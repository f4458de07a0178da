use bon::Builder;
use chrono::NaiveDate;

use crate::{
    api::day_ahead,
    core::{day::Day, mask::SLOTS_PER_DAY, series::PriceSeries},
    error::PlanError,
    prelude::*,
};

/// Day-ahead prices from the remote feed.
#[derive(Builder)]
pub struct RemoteApiSource {
    api: day_ahead::Api,

    /// Bidding zone, for example `DK1`.
    #[builder(into)]
    price_area: String,

    /// Price column to read.
    #[builder(into, default = String::from("DayAheadPriceEUR"))]
    column: String,
}

impl RemoteApiSource {
    #[instrument(skip_all, fields(price_area = %self.price_area))]
    pub async fn fetch(&self, today: NaiveDate, day: Day) -> Result<PriceSeries, PlanError> {
        let on = day.date(today);
        let body = self
            .api
            .get_day(on, &self.price_area)
            .await
            .map_err(|error| PlanError::SourceUnavailable { on, reason: format!("{error:#}") })?;
        let prices = day_ahead::parse_prices(&body, on, &self.column)
            .map_err(|error| PlanError::MalformedPriceData { on, reason: format!("{error:#}") })?;
        if prices.is_empty() {
            return Err(PlanError::SourceUnavailable { on, reason: "no records yet".to_owned() });
        }
        if prices.len() != SLOTS_PER_DAY {
            warn!(%on, n_prices = prices.len(), "incomplete day, using as-is");
        }
        Ok(prices.into())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()
    }

    fn source(server: &ServerGuard) -> Result<RemoteApiSource> {
        Ok(RemoteApiSource::builder()
            .api(day_ahead::Api::new(server.url().parse()?)?)
            .price_area("DK1")
            .build())
    }

    async fn respond(server: &mut ServerGuard, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/dataset/DayAheadPrices")
            .match_query(Matcher::UrlEncoded("start".into(), "2025-10-03".into()))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_fetch_tomorrow_ok() -> Result {
        let records = (0..96)
            .map(|slot| {
                format!(
                    r#"{{"TimeDK": "2025-10-03T{:02}:{:02}:00", "DayAheadPriceEUR": {}}}"#,
                    slot / 4,
                    (slot % 4) * 15,
                    slot,
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        let mut server = Server::new_async().await;
        let mock = respond(&mut server, 200, &format!(r#"{{"records": [{records}]}}"#)).await;
        let series = source(&server)?.fetch(today(), Day::Tomorrow).await?;
        assert_eq!(series.len(), 96);
        assert_eq!(series[95], 95.0);
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_partial_day_ok() -> Result {
        let mut server = Server::new_async().await;
        // language=json
        let body = r#"{"records": [{"TimeDK": "2025-10-03T00:00:00", "DayAheadPriceEUR": -1.5}]}"#;
        let _mock = respond(&mut server, 200, body).await;
        let series = source(&server)?.fetch(today(), Day::Tomorrow).await?;
        assert_eq!(*series, [-1.5]);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_empty_is_unavailable() -> Result {
        let mut server = Server::new_async().await;
        let _mock = respond(&mut server, 200, r#"{"records": []}"#).await;
        let result = source(&server)?.fetch(today(), Day::Tomorrow).await;
        assert!(matches!(result, Err(PlanError::SourceUnavailable { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_unavailable() -> Result {
        let mut server = Server::new_async().await;
        let _mock = respond(&mut server, 500, "").await;
        let result = source(&server)?.fetch(today(), Day::Tomorrow).await;
        assert!(matches!(result, Err(PlanError::SourceUnavailable { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_malformed() -> Result {
        let mut server = Server::new_async().await;
        let _mock = respond(&mut server, 200, "<html>maintenance</html>").await;
        let result = source(&server)?.fetch(today(), Day::Tomorrow).await;
        assert!(matches!(result, Err(PlanError::MalformedPriceData { .. })));
        Ok(())
    }
}
