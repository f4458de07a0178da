use clap::Parser;

use crate::{
    api::modbus,
    core::registers::{MaskGroup, Register},
    prelude::*,
    tables::{build_mask_table, build_registers_table},
    target::InverterRegisterTarget,
};

#[derive(Parser)]
pub struct ShowArgs {
    /// Modbus URL like `modbus+tcp://192.168.1.50:502/247`.
    #[clap(long = "inverter-url", env = "INVERTER_URL")]
    url: modbus::ParsedUrl,
}

impl ShowArgs {
    pub async fn run(self) -> Result {
        let client = modbus::Client::connect(&self.url).await?;

        let mut registers = Vec::new();
        for register in
            [Register::Enable, Register::TodayDate, Register::TomorrowDate, Register::BuySwitch]
        {
            registers.push((register, client.read_register(register).await?));
        }
        println!("{}", build_registers_table(&registers));

        let mut masks = Vec::with_capacity(MaskGroup::ALL.len());
        for group in MaskGroup::ALL {
            let mask = client.read_mask(group).await?;
            info!(%group, %mask, "read");
            masks.push((group.to_string(), mask));
        }
        println!("{}", build_mask_table(&masks));
        Ok(())
    }
}
