use std::iter::successors;

use chrono::{DateTime, Days, Local, MappedLocalTime, NaiveDateTime, NaiveTime, TimeDelta};

use crate::prelude::*;

/// Trigger at the same wall-clock time every day.
#[derive(Copy, Clone, Debug)]
pub struct Daily(pub NaiveTime);

impl Daily {
    /// Next trigger strictly after `now`.
    #[must_use]
    pub fn next_after(self, now: NaiveDateTime) -> NaiveDateTime {
        let at = now.date().and_time(self.0);
        if at > now { at } else { at + Days::new(1) }
    }
}

/// Daily attempts from `first` every `period` up to `last` inclusive.
#[derive(Copy, Clone, Debug)]
pub struct Window {
    first: NaiveTime,
    last: NaiveTime,
    period: TimeDelta,
}

impl Window {
    pub fn new(first: NaiveTime, last: NaiveTime, period: TimeDelta) -> Result<Self> {
        ensure!(period > TimeDelta::zero(), "the attempt period must be positive");
        ensure!(first <= last, "the window must start before it ends");
        Ok(Self { first, last, period })
    }

    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        (self.first..=self.last).contains(&time)
    }

    /// Attempt times within a day.
    pub fn attempts(&self) -> impl Iterator<Item = NaiveTime> + use<> {
        let (last, period) = (self.last, self.period);
        successors(Some(self.first), move |time| {
            let (next, wrapped_seconds) = time.overflowing_add_signed(period);
            (wrapped_seconds == 0 && next <= last).then_some(next)
        })
    }

    /// Next attempt strictly after `now`, on the next day when today's attempts are over.
    #[must_use]
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        self.attempts()
            .map(|time| today.and_time(time))
            .find(|at| *at > now)
            .unwrap_or_else(|| (today + Days::new(1)).and_time(self.first))
    }
}

/// Resolve the local wall-clock time, skipping forward over a daylight saving gap.
fn to_local(at: NaiveDateTime) -> DateTime<Local> {
    match at.and_local_timezone(Local) {
        MappedLocalTime::Single(at) | MappedLocalTime::Ambiguous(at, _) => at,
        MappedLocalTime::None => {
            warn!(%at, "non-existent local time");
            to_local(at + TimeDelta::hours(1))
        }
    }
}

/// Sleep until the local wall-clock time.
pub async fn sleep_until(at: NaiveDateTime) {
    let duration = (to_local(at) - Local::now()).to_std().unwrap_or_default();
    debug!(%at, ?duration, "sleeping…");
    tokio::time::sleep(duration).await;
}
