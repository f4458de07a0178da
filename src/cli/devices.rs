//! Device definitions file and the connections it describes.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use reqwest::Url;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    api::{day_ahead, home_assistant, modbus},
    config::{DevicePlanConfig, Feature},
    core::{policy::PlanPolicy, snapshot::BuySwitchMode},
    planner::Planner,
    prelude::*,
    registry::{Device, DeviceId},
    source::{EntitySource, PriceSource, RemoteApiSource, entity::ObservationSource},
};

#[must_use]
#[derive(Parser)]
pub struct DevicesArgs {
    /// TOML file with the device definitions.
    #[clap(long = "devices", env = "DEVICES_PATH", default_value = "devices.toml")]
    path: PathBuf,

    #[clap(flatten)]
    home_assistant: HomeAssistantArgs,

    #[clap(
        long = "day-ahead-api-base-url",
        env = "DAY_AHEAD_API_BASE_URL",
        default_value = day_ahead::Api::DEFAULT_BASE_URL,
    )]
    day_ahead_base_url: Url,
}

impl DevicesArgs {
    /// Connect the defined devices and configure the planner.
    ///
    /// With the filter, only the matching device is loaded and its connection failure is fatal.
    /// Otherwise, unreachable devices are skipped.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self, filter: Option<&DeviceId>) -> Result<Planner> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path.display()))?;
        let file: DevicesFile = toml::from_str(&text).context("failed to parse the devices")?;
        let observations = self.home_assistant.connect()?;

        let planner = Planner::default();
        for definition in file.devices {
            if filter.is_some_and(|id| *id != definition.id) {
                continue;
            }
            let source = definition.source.build(observations.as_ref(), &self.day_ahead_base_url)?;
            let client = match modbus::Client::connect(&definition.url).await {
                Ok(client) => client,
                Err(error) if filter.is_none() => {
                    warn!(device_id = %definition.id, "failed to connect, skipping: {error:#}");
                    continue;
                }
                Err(error) => {
                    return Err(error.context(format!("failed to connect `{}`", definition.id)));
                }
            };
            let device = planner.registry().register(Device::new(definition.id, Arc::new(client)));
            let config = DevicePlanConfig {
                source,
                sell: definition.sell,
                buy: definition.buy,
                buy_switch_mode: definition.buy_switch_mode,
                features: definition.features.into_iter().collect(),
            };
            planner.configure(device.id(), config)?;
        }
        if let Some(id) = filter {
            ensure!(planner.registry().get(id).is_ok(), "device `{id}` is not defined");
        }
        Ok(planner)
    }
}

#[must_use]
#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant API base URL, for example `http://localhost:8123/api`.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    base_url: Option<Url>,

    #[clap(
        long = "home-assistant-access-token",
        env = "HOME_ASSISTANT_ACCESS_TOKEN",
        hide_env_values = true
    )]
    access_token: Option<String>,
}

impl HomeAssistantArgs {
    fn connect(&self) -> Result<Option<Arc<dyn ObservationSource>>> {
        match (&self.base_url, &self.access_token) {
            (Some(base_url), Some(access_token)) => {
                let api: Arc<dyn ObservationSource> =
                    Arc::new(home_assistant::Api::new(access_token, base_url.clone())?);
                Ok(Some(api))
            }
            (None, None) => Ok(None),
            _ => bail!("both Home Assistant base URL and access token are required"),
        }
    }
}

#[derive(Deserialize)]
struct DevicesFile {
    #[serde(default)]
    devices: Vec<DeviceDefinition>,
}

#[serde_as]
#[derive(Deserialize)]
struct DeviceDefinition {
    id: DeviceId,

    /// Modbus URL like `modbus+tcp://192.168.1.50:502/247`.
    #[serde_as(as = "DisplayFromStr")]
    url: modbus::ParsedUrl,

    #[serde(default = "default_features")]
    features: Vec<Feature>,

    source: SourceDefinition,

    #[serde(default)]
    sell: PlanPolicy,

    #[serde(default)]
    buy: PlanPolicy,

    #[serde(default)]
    buy_switch_mode: BuySwitchMode,
}

fn default_features() -> Vec<Feature> {
    Feature::DEFAULT.iter().collect()
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SourceDefinition {
    Entity {
        entity_id: String,
        today_attribute: Option<String>,
        tomorrow_attribute: Option<String>,
    },

    RemoteApi {
        price_area: String,
        column: Option<String>,
    },
}

impl SourceDefinition {
    fn build(
        self,
        observations: Option<&Arc<dyn ObservationSource>>,
        day_ahead_base_url: &Url,
    ) -> Result<PriceSource> {
        match self {
            Self::Entity { entity_id, today_attribute, tomorrow_attribute } => {
                let observations = observations
                    .context("the entity source requires the Home Assistant connection")?;
                let source = EntitySource::builder()
                    .observations(Arc::clone(observations))
                    .entity_id(entity_id)
                    .maybe_today_attribute(today_attribute)
                    .maybe_tomorrow_attribute(tomorrow_attribute)
                    .build();
                Ok(PriceSource::Entity(source))
            }
            Self::RemoteApi { price_area, column } => {
                let source = RemoteApiSource::builder()
                    .api(day_ahead::Api::new(day_ahead_base_url.clone())?)
                    .price_area(price_area)
                    .maybe_column(column)
                    .build();
                Ok(PriceSource::RemoteApi(source))
            }
        }
    }
}
