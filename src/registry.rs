use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    config::DevicePlanConfig,
    error::PlanError,
    prelude::*,
    target::InverterRegisterTarget,
};

#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct DeviceId(String);

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Managed inverter.
pub struct Device {
    id: DeviceId,
    target: Arc<dyn InverterRegisterTarget>,
    config: RwLock<Option<Arc<DevicePlanConfig>>>,

    /// Serializes the plan writes to the device.
    plan_lock: Mutex<()>,
}

impl Device {
    pub fn new(id: DeviceId, target: Arc<dyn InverterRegisterTarget>) -> Self {
        Self { id, target, config: RwLock::new(None), plan_lock: Mutex::new(()) }
    }

    #[must_use]
    pub const fn id(&self) -> &DeviceId {
        &self.id
    }

    #[must_use]
    pub fn target(&self) -> &dyn InverterRegisterTarget {
        self.target.as_ref()
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Result<Arc<DevicePlanConfig>, PlanError> {
        let config = self.config.read().clone();
        config.ok_or_else(|| PlanError::ConfigurationMissing(self.id.clone()))
    }

    /// Wait for the exclusive right to write the plan.
    pub async fn lock_plan(&self) -> MutexGuard<'_, ()> {
        self.plan_lock.lock().await
    }
}

/// Devices by their identifiers.
#[derive(Default)]
pub struct Registry(RwLock<BTreeMap<DeviceId, Arc<Device>>>);

impl Registry {
    /// Add the device, replacing the one with the same identifier.
    #[instrument(skip_all, fields(device_id = %device.id))]
    pub fn register(&self, device: Device) -> Arc<Device> {
        let device = Arc::new(device);
        if self.0.write().insert(device.id.clone(), Arc::clone(&device)).is_some() {
            warn!("replaced the existing device");
        } else {
            info!("registered");
        }
        device
    }

    /// Replace the device configuration wholesale.
    #[instrument(skip_all, fields(device_id = %id))]
    pub fn configure(&self, id: &DeviceId, config: DevicePlanConfig) -> Result<(), PlanError> {
        let device = self.get(id)?;
        *device.config.write() = Some(Arc::new(config));
        info!("configured");
        Ok(())
    }

    pub fn get(&self, id: &DeviceId) -> Result<Arc<Device>, PlanError> {
        self.0.read().get(id).cloned().ok_or_else(|| PlanError::DeviceNotFound(id.clone()))
    }

    /// Devices in the identifier order.
    #[must_use]
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.0.read().values().cloned().collect()
    }
}

#[cfg(test)]
pub mod tests {
    use enumset::EnumSet;

    use super::*;
    use crate::{
        config::Feature,
        core::{policy::PlanPolicy, snapshot::BuySwitchMode},
        source::{EntitySource, PriceSource},
        testing::{MemoryTarget, StaticObservations},
    };

    pub fn entity_config(features: EnumSet<Feature>) -> DevicePlanConfig {
        DevicePlanConfig {
            source: PriceSource::Entity(
                EntitySource::builder()
                    .observations(Arc::new(StaticObservations::default()))
                    .entity_id("sensor.prices")
                    .build(),
            ),
            sell: PlanPolicy::default(),
            buy: PlanPolicy::default(),
            buy_switch_mode: BuySwitchMode::Disabled,
            features,
        }
    }

    #[test]
    fn test_configure_unknown_device() {
        let registry = Registry::default();
        let result = registry.configure(&"inverter".into(), entity_config(Feature::DEFAULT));
        assert!(matches!(result, Err(PlanError::DeviceNotFound(_))));
    }

    #[test]
    fn test_configure_ok() -> Result<(), PlanError> {
        let registry = Registry::default();
        let device =
            registry.register(Device::new("inverter".into(), Arc::new(MemoryTarget::default())));
        assert!(matches!(device.config(), Err(PlanError::ConfigurationMissing(_))));

        registry.configure(device.id(), entity_config(EnumSet::empty()))?;
        let old = device.config()?;
        assert!(!old.is_enabled());

        registry.configure(device.id(), entity_config(Feature::DEFAULT))?;
        assert!(device.config()?.is_enabled());

        // Readers keep the consistent snapshot:
        assert!(!old.is_enabled());
        Ok(())
    }

    #[test]
    fn test_devices_are_ordered_ok() {
        let registry = Registry::default();
        for id in ["b", "c", "a"] {
            registry.register(Device::new(id.into(), Arc::new(MemoryTarget::default())));
        }
        let ids: Vec<_> =
            registry.devices().iter().map(|device| device.id().to_string()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_get_unknown_device() {
        let registry = Registry::default();
        assert!(matches!(registry.get(&"inverter".into()), Err(PlanError::DeviceNotFound(_))));
    }
}
