use std::fmt::{Display, Formatter};

use chrono::{Days, NaiveDate};

/// Plan day relative to the current local date.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Day {
    Today,
    Tomorrow,
}

impl Day {
    pub fn date(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Tomorrow => today + Days::new(1),
        }
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Tomorrow => write!(f, "tomorrow"),
        }
    }
}
