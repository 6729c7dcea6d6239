use thiserror::Error;

#[derive(Error, Debug)]
pub enum HsmsError {
    #[error("connection closed mid-frame: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },

    #[error("frame declared length {declared} exceeds the configured cap of {cap}")]
    LengthOverflow { declared: u32, cap: u32 },

    #[error("unrecognized HSMS s-type {0:#04x}")]
    BadSType(u8),

    #[error("malformed HSMS header")]
    MalformedHeader,

    #[error("inter-byte gap exceeded T8")]
    T8Expired,

    #[error("no Select received within T7 of TCP connecting")]
    T7Expired,

    #[error("no control-message reply received within T6")]
    T6Expired,

    #[error("active-role connect attempts are throttled to one per T5")]
    T5Throttle,

    #[error("the HSMS connection was lost")]
    ConnectionLost,

    #[error("item codec error: {0}")]
    Codec(#[from] secs2::CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HsmsError>;
