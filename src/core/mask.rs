use std::{
    fmt::{Display, Formatter},
    ops::Not,
};

use itertools::Itertools;

use crate::error::PlanError;

/// Number of 15-minute slots in a day.
pub const SLOTS_PER_DAY: usize = 96;

/// Number of 16-bit registers holding one day.
pub const WORDS_PER_DAY: usize = 6;

const BITS_PER_WORD: usize = 16;

/// 96 quarter-hour slots of one calendar day packed into 6 words.
///
/// Bit `i % 16` of word `i / 16` is slot `i`, slot 0 being 00:00–00:15.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, derive_more::From, derive_more::Into)]
pub struct DayMask([u16; WORDS_PER_DAY]);

impl DayMask {
    pub const ZERO: Self = Self([0; WORDS_PER_DAY]);

    #[must_use]
    pub const fn words(self) -> [u16; WORDS_PER_DAY] {
        self.0
    }

    #[must_use]
    pub const fn is_set(self, slot: usize) -> bool {
        (self.0[slot / BITS_PER_WORD] >> (slot % BITS_PER_WORD)) & 1 == 1
    }

    #[must_use]
    pub fn count_ones(self) -> u32 {
        self.0.iter().map(|word| word.count_ones()).sum()
    }
}

impl Not for DayMask {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0.map(|word| !word))
    }
}

/// Takes the first 96 slots, missing slots are unset.
impl FromIterator<bool> for DayMask {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut words = [0; WORDS_PER_DAY];
        for (slot, is_set) in iter.into_iter().take(SLOTS_PER_DAY).enumerate() {
            if is_set {
                words[slot / BITS_PER_WORD] |= 1 << (slot % BITS_PER_WORD);
            }
        }
        Self(words)
    }
}

impl TryFrom<&[u16]> for DayMask {
    type Error = PlanError;

    fn try_from(words: &[u16]) -> Result<Self, Self::Error> {
        <[u16; WORDS_PER_DAY]>::try_from(words)
            .map(Self)
            .map_err(|_| PlanError::InvalidMaskLength(words.len()))
    }
}

impl Display for DayMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|word| format!("{word:#06X}")).join(" "))
    }
}
