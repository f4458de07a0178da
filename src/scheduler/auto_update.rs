use std::{collections::HashMap, sync::Arc};

use chrono::{Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use crate::{
    api::heartbeat::Heartbeat,
    planner::{Planner, UpdateReport},
    prelude::*,
    registry::DeviceId,
    scheduler::timing::{Window, sleep_until},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AutoUpdateState {
    /// Outside the attempt window.
    Waiting,

    /// Within the window, tomorrow's prices have not been written yet.
    Polling,

    /// Tomorrow's prices are written, nothing to do until the next day.
    Satisfied,
}

/// Polls the remote feed for tomorrow's prices during the afternoon.
pub struct AutoUpdateScheduler {
    planner: Arc<Planner>,
    window: Window,

    /// Local date on which each device got tomorrow's prices.
    satisfied: Mutex<HashMap<DeviceId, NaiveDate>>,

    busy: tokio::sync::Mutex<()>,
}

impl AutoUpdateScheduler {
    pub fn new(planner: Arc<Planner>, window: Window) -> Self {
        Self {
            planner,
            window,
            satisfied: Mutex::new(HashMap::new()),
            busy: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn run(&self, heartbeat: &Heartbeat) {
        info!(window = ?self.window, "scheduled the auto-update");
        loop {
            // The timer fires after the deadline, so the window is checked at the scheduled time.
            let attempt = self.window.next_after(Local::now().naive_local());
            sleep_until(attempt).await;
            if self.tick(attempt).await.is_some() {
                heartbeat.send().await;
            }
        }
    }

    #[must_use]
    pub fn state(&self, id: &DeviceId, now: NaiveDateTime) -> AutoUpdateState {
        if self.satisfied.lock().get(id) == Some(&now.date()) {
            AutoUpdateState::Satisfied
        } else if self.window.contains(now.time()) {
            AutoUpdateState::Polling
        } else {
            AutoUpdateState::Waiting
        }
    }

    /// Run the attempt scheduled at `now` for every polling device.
    ///
    /// Returns [`None`] when the previous tick is still running.
    #[instrument(skip_all, fields(now = %now))]
    pub async fn tick(&self, now: NaiveDateTime) -> Option<Vec<(DeviceId, UpdateReport)>> {
        let Ok(_busy) = self.busy.try_lock() else {
            warn!("the previous auto-update is still running, skipping");
            return None;
        };
        let today = now.date();
        self.satisfied.lock().retain(|_, on| *on == today);

        let mut reports = Vec::new();
        for device in self.planner.registry().devices() {
            let Ok(config) = device.config() else {
                continue;
            };
            if !config.is_auto_updated() {
                continue;
            }
            match self.state(device.id(), now) {
                AutoUpdateState::Polling => {}
                state => {
                    debug!(device_id = %device.id(), ?state, "skipping");
                    continue;
                }
            }
            let report = Planner::update(&device, &config, today).await;
            if report.tomorrow.is_ok() {
                info!(device_id = %device.id(), "tomorrow's prices are written");
                self.satisfied.lock().insert(device.id().clone(), today);
            }
            reports.push((device.id().clone(), report));
        }
        Some(reports)
    }
}
