use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate};
use tokio_modbus::Address;

use crate::core::{
    mask::{DayMask, WORDS_PER_DAY},
    snapshot::PlanSnapshot,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MaskGroup {
    SellToday,
    SellTomorrow,
    BuyToday,
    BuyTomorrow,
}

impl MaskGroup {
    pub const ALL: [Self; 4] =
        [Self::SellToday, Self::SellTomorrow, Self::BuyToday, Self::BuyTomorrow];

    /// The 6 mask registers in the slot order.
    pub fn registers(self) -> impl Iterator<Item = Register> {
        (0..WORDS_PER_DAY as u16).map(move |index| Register::Mask(self, index))
    }

    const fn first_address(self) -> Address {
        match self {
            Self::SellToday => 47787,
            Self::SellTomorrow => 47794,
            Self::BuyToday => 47801,
            Self::BuyTomorrow => 47807,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::SellToday => "sell_today",
            Self::SellTomorrow => "sell_tomorrow",
            Self::BuyToday => "buy_today",
            Self::BuyTomorrow => "buy_tomorrow",
        }
    }
}

impl Display for MaskGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Named plan register.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    Enable,
    TodayDate,
    TomorrowDate,
    BuySwitch,

    /// Mask word by its zero-based index within the group.
    Mask(MaskGroup, u16),
}

impl Register {
    /// Holding register address.
    pub const fn address(self) -> Address {
        match self {
            Self::Enable => 47785,
            Self::TodayDate => 47786,
            Self::TomorrowDate => 47793,
            Self::BuySwitch => 47800,
            Self::Mask(group, index) => group.first_address() + index,
        }
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enable => write!(f, "neg_price_enable"),
            Self::TodayDate => write!(f, "neg_price_rtc_today"),
            Self::TomorrowDate => write!(f, "neg_price_rtc_tomorrow"),
            Self::BuySwitch => write!(f, "neg_price_buy_switch"),
            Self::Mask(group, index) => write!(f, "neg_price_{group}_{}", index + 1),
        }
    }
}

/// RTC date stamp: month in the high byte and day in the low byte.
#[must_use]
pub fn date_stamp(date: NaiveDate) -> u16 {
    #[expect(clippy::cast_possible_truncation)]
    let (month, day) = (date.month() as u16, date.day() as u16);
    (month << 8) | day
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegisterWrite {
    pub register: Register,
    pub value: u16,
}

/// Ordered register writes of a plan snapshot.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, derive_more::IntoIterator)]
pub struct RegisterWrites(#[into_iterator(owned, ref)] Vec<RegisterWrite>);

impl RegisterWrites {
    #[must_use]
    pub fn as_slice(&self) -> &[RegisterWrite] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, register: Register, value: u16) {
        self.0.push(RegisterWrite { register, value });
    }

    fn push_mask(&mut self, group: MaskGroup, mask: DayMask) {
        for (register, word) in group.registers().zip(mask.words()) {
            self.push(register, word);
        }
    }
}

impl From<&PlanSnapshot> for RegisterWrites {
    fn from(snapshot: &PlanSnapshot) -> Self {
        let mut writes = Self::default();
        if let Some(enable) = snapshot.enable {
            writes.push(Register::Enable, u16::from(enable));
        }
        if let Some(mask) = snapshot.sell_today {
            writes.push(Register::TodayDate, date_stamp(snapshot.date));
            writes.push_mask(MaskGroup::SellToday, mask);
        }
        if let Some(mask) = snapshot.sell_tomorrow {
            writes.push(Register::TomorrowDate, date_stamp(snapshot.tomorrow()));
            writes.push_mask(MaskGroup::SellTomorrow, mask);
        }
        if let Some(mode) = snapshot.buy_switch_mode {
            writes.push(Register::BuySwitch, mode.into());
        }
        if let Some(mask) = snapshot.buy_today {
            writes.push_mask(MaskGroup::BuyToday, mask);
        }
        if let Some(mask) = snapshot.buy_tomorrow {
            writes.push_mask(MaskGroup::BuyTomorrow, mask);
        }
        writes
    }
}
