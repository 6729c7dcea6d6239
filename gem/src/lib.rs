//! GEM (SEMI E30) behavior on top of `hsms`: the communication phase gate, the equipment
//! control-state lattice, and the dicing-tool process-state lattice. Pure state machines only —
//! no I/O — so the `dispatcher` and `equipment` crates drive them from the real event loop.

mod control;
mod error;
mod phase;
mod process;

pub use control::ControlEvent;
pub use control::ControlMachine;
pub use control::ControlState;
pub use control::DefaultControlState;
pub use error::TransitionError;
pub use phase::min_phase_for;
pub use phase::Phase;
pub use phase::PhaseGate;
pub use process::ProcessMachine;
pub use process::ProcessState;
