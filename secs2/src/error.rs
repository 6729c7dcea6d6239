use thiserror::Error;

/// Errors that can occur while decoding or encoding a SECS-II [`crate::Item`].
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CodecError {
    #[error("item buffer truncated: need {needed} bytes, have {available}")]
    MalformedItem { needed: usize, available: usize },

    #[error("item format code {0:#04x} is not a recognized SECS-II type")]
    UnknownFormatCode(u8),

    #[error("item length-of-length field is zero")]
    ZeroLengthOfLength,

    #[error("numeric item body length {0} is not a multiple of the element width")]
    MisalignedNumericBody(usize),

    #[error("ASCII item body is not valid ASCII")]
    NotAscii,

    #[error("nesting depth exceeded the configured maximum of {0}")]
    NestingTooDeep(usize),

    #[error("list declares {0} items but only {1} remain in the buffer")]
    ListLengthOverrun(u32, usize),
}

pub type Result<T> = std::result::Result<T, CodecError>;
