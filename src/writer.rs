use crate::{
    core::{
        registers::{RegisterWrite, RegisterWrites},
        snapshot::PlanSnapshot,
    },
    error::PlanError,
    prelude::*,
    target::InverterRegisterTarget,
};

/// Write the snapshot registers one by one.
///
/// The first failed write aborts the remaining ones, nothing is rolled back.
/// Returns the number of the written registers.
#[instrument(skip_all, fields(date = %snapshot.date))]
pub async fn apply(
    target: &dyn InverterRegisterTarget,
    snapshot: &PlanSnapshot,
) -> Result<usize, PlanError> {
    let writes = RegisterWrites::from(snapshot);
    if writes.is_empty() {
        debug!("nothing to write");
        return Ok(0);
    }
    let n_writes = writes.len();
    debug!(n_writes, "writing…");
    for &RegisterWrite { register, value } in writes.as_slice() {
        trace!(%register, value, "writing…");
        target
            .write_register(register, value)
            .await
            .map_err(|source| PlanError::RegisterWriteFailed { register, source })?;
    }
    info!(n_writes, "written");
    Ok(n_writes)
}
