use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::{
    core::registers::Register,
    prelude::*,
    source::entity::{Observation, ObservationSource},
    target::InverterRegisterTarget,
};

/// In-memory register map.
#[derive(Default)]
pub struct MemoryTarget {
    registers: Mutex<HashMap<Register, u16>>,
    n_writes: Mutex<usize>,
    failing_writes: HashSet<Register>,
    failing_reads: HashSet<Register>,
}

impl MemoryTarget {
    pub fn failing_on(register: Register) -> Self {
        Self { failing_writes: HashSet::from([register]), ..Self::default() }
    }

    pub fn failing_reads(registers: impl IntoIterator<Item = Register>) -> Self {
        Self { failing_reads: registers.into_iter().collect(), ..Self::default() }
    }

    pub fn with(self, register: Register, value: u16) -> Self {
        self.registers.lock().insert(register, value);
        self
    }

    pub fn get(&self, register: Register) -> Option<u16> {
        self.registers.lock().get(&register).copied()
    }

    pub fn registers(&self) -> HashMap<Register, u16> {
        self.registers.lock().clone()
    }

    /// Number of the successful writes.
    pub fn n_writes(&self) -> usize {
        *self.n_writes.lock()
    }
}

#[async_trait]
impl InverterRegisterTarget for MemoryTarget {
    async fn read_register(&self, register: Register) -> Result<u16> {
        ensure!(!self.failing_reads.contains(&register), "`{register}` is not readable");
        self.get(register).with_context(|| format!("`{register}` has never been written"))
    }

    async fn write_register(&self, register: Register, value: u16) -> Result {
        ensure!(!self.failing_writes.contains(&register), "`{register}` is not writable");
        self.registers.lock().insert(register, value);
        *self.n_writes.lock() += 1;
        Ok(())
    }
}

/// Fixed set of observations.
#[derive(Default)]
pub struct StaticObservations(HashMap<String, Observation>);

impl StaticObservations {
    pub fn with(mut self, entity_id: &str, state: &str, attributes: Value) -> Self {
        let attributes = match attributes {
            Value::Object(attributes) => attributes,
            _ => Map::new(),
        };
        self.0.insert(entity_id.to_owned(), Observation { state: state.to_owned(), attributes });
        self
    }
}

#[async_trait]
impl ObservationSource for StaticObservations {
    async fn get_observation(&self, entity_id: &str) -> Result<Option<Observation>> {
        Ok(self.0.get(entity_id).cloned())
    }
}
