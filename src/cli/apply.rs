use std::num::ParseIntError;

use chrono::Local;
use clap::Parser;

use crate::{
    cli::devices::DevicesArgs,
    core::{
        policy::{Granularity, PlanPolicy},
        snapshot::BuySwitchMode,
    },
    planner::{ImmediatePlan, MaskInput},
    prelude::*,
    registry::DeviceId,
};

#[derive(Parser)]
pub struct ApplyArgs {
    #[clap(flatten)]
    devices: DevicesArgs,

    #[clap(long = "device", env = "DEVICE_ID")]
    device_id: DeviceId,

    /// Turn the plan on or off on the inverter.
    #[clap(long)]
    enable: Option<bool>,

    /// Buy switch mode: `disabled`, `charge-only`, or `charge-and-sell`.
    #[clap(long = "buy-switch")]
    buy_switch_mode: Option<BuySwitchMode>,

    #[clap(flatten)]
    masks: MaskArgs,

    #[clap(flatten)]
    prices: PriceArgs,

    #[clap(long, default_value = "0", allow_negative_numbers = true)]
    sell_threshold: f64,

    #[clap(long, default_value = "0", allow_negative_numbers = true)]
    buy_threshold: f64,

    /// Invert the sell mask after the comparison.
    #[clap(long)]
    flip_sell: bool,

    /// Invert the buy mask after the comparison.
    #[clap(long)]
    flip_buy: bool,

    /// Duration covered by one price: 15, 30, or 60 minutes.
    #[clap(long, default_value = "60")]
    slot_minutes: Granularity,
}

/// Explicit mask words, decimal or `0x`-prefixed, 6 per day.
#[derive(Parser)]
struct MaskArgs {
    #[clap(long, value_delimiter = ',', value_parser = parse_word)]
    sell_today_masks: Vec<u16>,

    #[clap(long, value_delimiter = ',', value_parser = parse_word)]
    sell_tomorrow_masks: Vec<u16>,

    #[clap(long, value_delimiter = ',', value_parser = parse_word)]
    buy_today_masks: Vec<u16>,

    #[clap(long, value_delimiter = ',', value_parser = parse_word)]
    buy_tomorrow_masks: Vec<u16>,
}

/// Prices to encode when the masks are not given.
#[derive(Parser)]
struct PriceArgs {
    #[clap(long, value_delimiter = ',', allow_negative_numbers = true)]
    sell_today_prices: Vec<f64>,

    #[clap(long, value_delimiter = ',', allow_negative_numbers = true)]
    sell_tomorrow_prices: Vec<f64>,

    #[clap(long, value_delimiter = ',', allow_negative_numbers = true)]
    buy_today_prices: Vec<f64>,

    #[clap(long, value_delimiter = ',', allow_negative_numbers = true)]
    buy_tomorrow_prices: Vec<f64>,
}

impl ApplyArgs {
    pub async fn run(self) -> Result {
        let plan = self.to_plan()?;
        let planner = self.devices.load(Some(&self.device_id)).await?;
        let n_writes =
            planner.apply_immediate(&self.device_id, &plan, Local::now().date_naive()).await?;
        info!(device_id = %self.device_id, n_writes, "applied");
        Ok(())
    }

    fn to_plan(&self) -> Result<ImmediatePlan> {
        let (masks, prices) = (&self.masks, &self.prices);
        let plan = ImmediatePlan {
            enable: self.enable,
            buy_switch_mode: self.buy_switch_mode,
            sell_today: MaskInput::from_args(
                &masks.sell_today_masks,
                prices.sell_today_prices.clone(),
            )?,
            sell_tomorrow: MaskInput::from_args(
                &masks.sell_tomorrow_masks,
                prices.sell_tomorrow_prices.clone(),
            )?,
            buy_today: MaskInput::from_args(
                &masks.buy_today_masks,
                prices.buy_today_prices.clone(),
            )?,
            buy_tomorrow: MaskInput::from_args(
                &masks.buy_tomorrow_masks,
                prices.buy_tomorrow_prices.clone(),
            )?,
            sell_policy: PlanPolicy {
                threshold: self.sell_threshold,
                invert: self.flip_sell,
                granularity: self.slot_minutes,
            },
            buy_policy: PlanPolicy {
                threshold: self.buy_threshold,
                invert: self.flip_buy,
                granularity: self.slot_minutes,
            },
        };
        ensure!(!plan.to_snapshot(Local::now().date_naive()).is_empty(), "nothing to apply");
        Ok(plan)
    }
}

fn parse_word(text: &str) -> Result<u16, ParseIntError> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    }
}
