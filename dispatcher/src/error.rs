use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no handler registered for S{stream}F{function}")]
    UnknownHandler { stream: u8, function: u8 },

    #[error("reply not received within T3")]
    T3Timeout,

    #[error("connection lost while a transaction was outstanding")]
    ConnectionLost,

    #[error("message not permitted in the current GEM phase")]
    PhaseViolation,

    #[error(transparent)]
    Codec(#[from] secs2::CodecError),

    #[error(transparent)]
    Transition(#[from] gem::TransitionError),

    #[error(transparent)]
    Model(#[from] equipment_model::ModelError),
}
