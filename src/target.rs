use async_trait::async_trait;

use crate::{
    core::{
        mask::{DayMask, WORDS_PER_DAY},
        registers::{MaskGroup, Register},
    },
    prelude::*,
};

/// Plan register interface of an inverter.
#[async_trait]
pub trait InverterRegisterTarget: Send + Sync {
    async fn read_register(&self, register: Register) -> Result<u16>;

    async fn write_register(&self, register: Register, value: u16) -> Result;

    /// Read back the 6 words of the mask group.
    async fn read_mask(&self, group: MaskGroup) -> Result<DayMask> {
        let mut words = Vec::with_capacity(WORDS_PER_DAY);
        for register in group.registers() {
            words.push(self.read_register(register).await?);
        }
        Ok(DayMask::try_from(words.as_slice())?)
    }
}
