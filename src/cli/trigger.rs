use chrono::Local;
use clap::Parser;

use crate::{
    cli::devices::DevicesArgs,
    prelude::*,
    registry::DeviceId,
    tables::build_update_table,
};

#[derive(Parser)]
pub struct TriggerArgs {
    #[clap(flatten)]
    devices: DevicesArgs,

    /// Update only this device, all the configured devices by default.
    #[clap(long = "device", env = "DEVICE_ID")]
    device_id: Option<DeviceId>,
}

impl TriggerArgs {
    pub async fn run(self) -> Result {
        let planner = self.devices.load(self.device_id.as_ref()).await?;
        let reports =
            planner.trigger_update(self.device_id.as_ref(), Local::now().date_naive()).await?;
        println!("{}", build_update_table(&reports));
        Ok(())
    }
}
