mod apply;
mod devices;
mod encode;
mod run;
mod show;
mod trigger;

use clap::{Parser, Subcommand};

use crate::{
    cli::{
        apply::ApplyArgs,
        encode::EncodeArgs,
        run::RunArgs,
        show::ShowArgs,
        trigger::TriggerArgs,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: roll the plans over at midnight and fetch tomorrow's prices in the afternoon.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Write the plan supplied on the command line right away.
    #[clap(name = "apply")]
    Apply(Box<ApplyArgs>),

    /// Fetch the prices and write today's and tomorrow's plans once.
    #[clap(name = "trigger")]
    Trigger(Box<TriggerArgs>),

    /// Print the mask for the prices without touching any device.
    #[clap(name = "encode")]
    Encode(Box<EncodeArgs>),

    /// Read the plan registers back from the inverter.
    #[clap(name = "show")]
    Show(Box<ShowArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Run(args) => args.run().await,
            Self::Apply(args) => args.run().await,
            Self::Trigger(args) => args.run().await,
            Self::Encode(args) => args.run(),
            Self::Show(args) => args.run().await,
        }
    }
}
