pub mod auto_update;
pub mod rollover;
pub mod timing;

pub use self::{auto_update::AutoUpdateScheduler, rollover::RolloverScheduler};
