//! The per-device data model of §3/§4.6: typed SVID/ECID/ALID/CEID/RPTID registries, the
//! report/event engine, and the alarm engine. No I/O and no knowledge of HSMS or GEM phases —
//! the `dispatcher` crate wires this to the wire protocol.

mod alarm;
mod alid;
mod ceid;
mod ecid;
mod error;
mod registry;
mod report;
mod svid;

pub use alarm::AlarmEngine;
pub use alarm::AlarmReport;
pub use alid::AlidEntry;
pub use ceid::CeidEntry;
pub use ecid::EcidEntry;
pub use error::ModelError;
pub use registry::ChangeObserver;
pub use registry::Registry;
pub use report::MaterializedReport;
pub use report::ReportEngine;
pub use report::DRACK_INSUFFICIENT_SPACE;
pub use report::DRACK_INVALID_FORMAT;
pub use report::DRACK_OK;
pub use report::DRACK_REPORT_IN_USE;
pub use report::DRACK_UNKNOWN_VID;
pub use report::ERACK_DENIED;
pub use report::ERACK_OK;
pub use report::LRACK_OK;
pub use report::LRACK_UNKNOWN_CEID;
pub use report::LRACK_UNKNOWN_RPTID;
pub use svid::SvidEntry;
