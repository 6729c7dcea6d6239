//! SECS-II data-item codec and message envelope (SEMI E5).
//!
//! This crate knows nothing about TCP, HSMS framing, or GEM phases; it only encodes and decodes
//! the recursive `Item` grammar and carries the `(stream, function, system-bytes, device-id)`
//! identity of a message. The `hsms` crate wraps a `Message` into wire frames.

mod error;
mod item;
mod message;

pub use error::CodecError;
pub use error::Result;
pub use item::Item;
pub use item::MAX_LENGTH;
pub use item::MAX_NESTING_DEPTH;
pub use message::Message;
