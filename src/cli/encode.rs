use clap::Parser;

use crate::{
    core::{
        policy::{Granularity, PlanPolicy},
        series::PriceSeries,
    },
    prelude::*,
    tables::build_mask_table,
};

#[derive(Parser)]
pub struct EncodeArgs {
    /// Comma-separated prices starting at midnight.
    #[clap(value_delimiter = ',', allow_negative_numbers = true, required = true)]
    prices: Vec<f64>,

    /// Prices strictly below the threshold set their slots.
    #[clap(long, default_value = "0", allow_negative_numbers = true)]
    threshold: f64,

    /// Invert the mask after the comparison.
    #[clap(long)]
    flip: bool,

    /// Duration covered by one price: 15, 30, or 60 minutes.
    #[clap(long, default_value = "60")]
    slot_minutes: Granularity,
}

impl EncodeArgs {
    pub fn run(self) -> Result {
        let policy = PlanPolicy {
            threshold: self.threshold,
            invert: self.flip,
            granularity: self.slot_minutes,
        };
        let mask = PriceSeries::from(self.prices).encode(policy);
        info!(n_set_slots = mask.count_ones(), "encoded");
        println!("{}", build_mask_table(&[("Mask", mask)]));
        println!("{mask}");
        Ok(())
    }
}
