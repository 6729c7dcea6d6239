//! The PLC I/O layer named at its interface only (§1, §4.10): a bidirectional key→value bridge
//! to the physical controller. It carries no nontrivial invariants, so it is out of this core's
//! scope beyond the trait and a null implementation for running without hardware attached.

use log::warn;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum PlcValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Error, Debug)]
pub enum PlcError {
    #[error("unknown PLC address {0}")]
    UnknownAddress(String),
    #[error("PLC link unavailable: {0}")]
    Unavailable(String),
}

/// A handler that needs to call out to the PLC must hold a deadline `<= T3 - epsilon` and yield
/// before it, per §5 "Suspension points" — this crate names the trait only; the `equipment`
/// binary pushes real implementations' calls onto `spawn_blocking`.
pub trait PlcLink: Send + Sync {
    fn read(&self, addr: &str) -> Result<PlcValue, PlcError>;
    fn write(&self, addr: &str, value: PlcValue) -> Result<(), PlcError>;
}

/// Always returns a configured default on read and logs writes; satisfies `PlcLink` for tests
/// and for running the equipment stack without hardware attached.
pub struct NullPlcLink {
    default_value: PlcValue,
}

impl NullPlcLink {
    pub fn new(default_value: PlcValue) -> NullPlcLink {
        NullPlcLink { default_value }
    }
}

impl Default for NullPlcLink {
    fn default() -> NullPlcLink {
        NullPlcLink::new(PlcValue::Bool(false))
    }
}

impl PlcLink for NullPlcLink {
    fn read(&self, addr: &str) -> Result<PlcValue, PlcError> {
        warn!("NullPlcLink: read({addr}) returning configured default, no PLC attached");
        Ok(self.default_value.clone())
    }

    fn write(&self, addr: &str, value: PlcValue) -> Result<(), PlcError> {
        warn!("NullPlcLink: write({addr}, {value:?}) discarded, no PLC attached");
        Ok(())
    }
}
