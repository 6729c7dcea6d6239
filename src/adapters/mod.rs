//! External collaborators named at their interface only, per §1 and SPEC_FULL.md §4.10.

mod plc;
mod store;

pub use plc::NullPlcLink;
pub use plc::PlcError;
pub use plc::PlcLink;
pub use plc::PlcValue;
pub use store::FileMappingStore;
pub use store::MappingStore;
pub use store::NullMappingStore;
pub use store::PersistedState;
pub use store::StoreError;
