//! HSMS (SEMI E37) transport: frame I/O over TCP, the connection state machine, and the five
//! SEMI timers. Built on `secs2` for the message/item types it carries.

mod connection;
mod error;
mod frame;
mod framer;
mod timers;

pub use connection::ConnectionEvent;
pub use connection::ConnectionMachine;
pub use connection::ConnectionState;
pub use connection::DeselectOutcome;
pub use connection::SelectOutcome;
pub use error::HsmsError;
pub use error::Result;
pub use frame::decode as decode_frame;
pub use frame::encode as encode_frame;
pub use frame::ControlMessage;
pub use frame::ControlType;
pub use frame::Frame;
pub use framer::read_frame;
pub use framer::write_frame;
pub use framer::FramerConfig;
pub use framer::DEFAULT_MAX_FRAME_LEN;
pub use timers::check_t5;
pub use timers::with_deadline;
pub use timers::TimerConfig;
