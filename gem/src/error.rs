use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("GEM phase can only advance one step at a time (from ordinal {from_ordinal} tried {to_ordinal})")]
    PhaseSkipped { from_ordinal: u8, to_ordinal: u8 },

    #[error("message not permitted below the required GEM phase")]
    PhaseViolation,

    #[error("control state transition is invalid from the current state")]
    InvalidControlTransition,

    #[error("process state transition from {0:?} to {1:?} is not adjacent")]
    InvalidProcessTransition(crate::process::ProcessState, crate::process::ProcessState),

    #[error("Start requires RemoteEnabled and GEM phase Initialized")]
    StartNotPermitted,
}
