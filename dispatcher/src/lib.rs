//! The message dispatcher of §4.8: the per-(stream, function) handler table gated by the GEM
//! phase, the transaction table for W=1 primaries, and the concrete handlers of the message
//! catalog in §6.

mod catalog;
mod context;
mod error;
mod events;
mod table;
mod transaction;

pub use context::DeviceContext;
pub use error::DispatchError;
pub use events::s5f1_item;
pub use events::s6f11_item;
pub use table::Dispatcher;
pub use transaction::TransactionTable;
