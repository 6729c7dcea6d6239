use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown SVID {0}")]
    UnknownSvid(u32),

    #[error("unknown ECID {0}")]
    UnknownEcid(u32),

    #[error("unknown ALID {0}")]
    UnknownAlid(u32),

    #[error("unknown CEID {0}")]
    UnknownCeid(u32),

    #[error("unknown RPTID {0}")]
    UnknownRptid(u32),

    #[error("SVID {0} is read-only")]
    ReadOnly(u32),

    #[error("ECID {ecid} value out of range [{min:?}, {max:?}]")]
    OutOfRange {
        ecid: u32,
        min: Option<i64>,
        max: Option<i64>,
    },
}
