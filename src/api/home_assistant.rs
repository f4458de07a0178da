use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    prelude::*,
    source::entity::{Observation, ObservationSource},
};

pub struct Api {
    client: reqwest::Client,
    base_url: Url,
}

impl Api {
    /// Build the client for the base URL like `http://localhost:8123/api`.
    pub fn new(access_token: &str, base_url: Url) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .context("invalid access token")?;
        authorization.set_sensitive(true);
        let client = reqwest::Client::builder()
            .default_headers(HeaderMap::from_iter([(AUTHORIZATION, authorization)]))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ObservationSource for Api {
    #[instrument(skip_all, fields(entity_id = entity_id))]
    async fn get_observation(&self, entity_id: &str) -> Result<Option<Observation>> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .push("states")
            .push(entity_id);
        debug!("fetching…");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to request the state of `{entity_id}`"))?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("entity not found");
            return Ok(None);
        }
        let observation: Observation = response
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("failed to deserialize the state of `{entity_id}`"))?;
        debug!(state = observation.state, n_attributes = observation.attributes.len(), "fetched");
        Ok(Some(observation))
    }
}
