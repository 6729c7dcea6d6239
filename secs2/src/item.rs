use crate::error::CodecError;
use crate::error::Result;

/// Maximum recursion depth `decode` will follow into nested `L` items.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum value a SECS-II length field can carry (3 bytes, 2^24 - 1).
pub const MAX_LENGTH: usize = (1 << 24) - 1;

const FMT_LIST: u8 = 0x00;
const FMT_BINARY: u8 = 0x20;
const FMT_BOOLEAN: u8 = 0x24;
const FMT_ASCII: u8 = 0x40;
const FMT_I8: u8 = 0x60;
const FMT_I1: u8 = 0x64;
const FMT_I2: u8 = 0x68;
const FMT_I4: u8 = 0x70;
const FMT_F8: u8 = 0x80;
const FMT_F4: u8 = 0x90;
const FMT_U8: u8 = 0xA0;
const FMT_U1: u8 = 0xA4;
const FMT_U2: u8 = 0xA8;
const FMT_U4: u8 = 0xB0;

/// A SECS-II data item: the recursive grammar underlying every message body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Item {
    List(Vec<Item>),
    Ascii(String),
    Binary(Vec<u8>),
    Boolean(Vec<bool>),
    I1(Vec<i8>),
    I2(Vec<i16>),
    I4(Vec<i32>),
    I8(Vec<i64>),
    U1(Vec<u8>),
    U2(Vec<u16>),
    U4(Vec<u32>),
    U8(Vec<u64>),
    F4(Vec<f32>),
    F8(Vec<f64>),
}

impl Item {
    /// Convenience constructor for a single-element U4, the common VID/CEID/RPTID wire type.
    pub fn u4(v: u32) -> Item {
        Item::U4(vec![v])
    }

    fn format_code(&self) -> u8 {
        match self {
            Item::List(_) => FMT_LIST,
            Item::Ascii(_) => FMT_ASCII,
            Item::Binary(_) => FMT_BINARY,
            Item::Boolean(_) => FMT_BOOLEAN,
            Item::I1(_) => FMT_I1,
            Item::I2(_) => FMT_I2,
            Item::I4(_) => FMT_I4,
            Item::I8(_) => FMT_I8,
            Item::U1(_) => FMT_U1,
            Item::U2(_) => FMT_U2,
            Item::U4(_) => FMT_U4,
            Item::U8(_) => FMT_U8,
            Item::F4(_) => FMT_F4,
            Item::F8(_) => FMT_F8,
        }
    }

    /// Length field value: element count for `List`, byte count for everything else.
    fn wire_length(&self) -> usize {
        match self {
            Item::List(items) => items.len(),
            Item::Ascii(s) => s.len(),
            Item::Binary(b) => b.len(),
            Item::Boolean(b) => b.len(),
            Item::I1(v) => v.len(),
            Item::U1(v) => v.len(),
            Item::I2(v) => v.len() * 2,
            Item::U2(v) => v.len() * 2,
            Item::I4(v) => v.len() * 4,
            Item::U4(v) => v.len() * 4,
            Item::F4(v) => v.len() * 4,
            Item::I8(v) => v.len() * 8,
            Item::U8(v) => v.len() * 8,
            Item::F8(v) => v.len() * 8,
        }
    }

    /// Encodes this item and everything beneath it into `out`, appending.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = self.wire_length();
        if len > MAX_LENGTH {
            return Err(CodecError::ListLengthOverrun(len as u32, MAX_LENGTH));
        }
        let len_bytes = encode_length(len);
        out.push(self.format_code() | len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);

        match self {
            Item::List(items) => {
                for item in items {
                    item.encode_into(out)?;
                }
            }
            Item::Ascii(s) => out.extend_from_slice(s.as_bytes()),
            Item::Binary(b) => out.extend_from_slice(b),
            Item::Boolean(b) => out.extend(b.iter().map(|&v| if v { 1u8 } else { 0u8 })),
            Item::I1(v) => out.extend(v.iter().map(|&x| x as u8)),
            Item::U1(v) => out.extend_from_slice(v),
            Item::I2(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::U2(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::I4(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::U4(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::F4(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::I8(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::U8(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
            Item::F8(v) => v.iter().for_each(|&x| out.extend_from_slice(&x.to_be_bytes())),
        }
        Ok(())
    }

    /// Encodes this item as a freestanding byte vector.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decodes a single item from the front of `buf`, returning it and the number of bytes
    /// consumed. The length field is validated against the remaining buffer before any
    /// allocation is made, per the codec's `MalformedItem` contract.
    pub fn decode(buf: &[u8]) -> Result<(Item, usize)> {
        Self::decode_depth(buf, 0)
    }

    fn decode_depth(buf: &[u8], depth: usize) -> Result<(Item, usize)> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        if buf.is_empty() {
            return Err(CodecError::MalformedItem {
                needed: 1,
                available: 0,
            });
        }
        let format_byte = buf[0];
        let lol = (format_byte & 0x03) as usize;
        if lol == 0 {
            return Err(CodecError::ZeroLengthOfLength);
        }
        let fmt = format_byte & 0xFC;

        if buf.len() < 1 + lol {
            return Err(CodecError::MalformedItem {
                needed: 1 + lol,
                available: buf.len(),
            });
        }
        let mut length: usize = 0;
        for &b in &buf[1..1 + lol] {
            length = (length << 8) | b as usize;
        }
        let header_len = 1 + lol;
        let body = &buf[header_len..];

        match fmt {
            FMT_LIST => {
                if length > body.len() {
                    return Err(CodecError::ListLengthOverrun(length as u32, body.len()));
                }
                let mut items = Vec::with_capacity(length.min(4096));
                let mut consumed = 0usize;
                for _ in 0..length {
                    let (item, n) = Item::decode_depth(&body[consumed..], depth + 1)?;
                    consumed += n;
                    items.push(item);
                }
                Ok((Item::List(items), header_len + consumed))
            }
            _ => {
                if length > body.len() {
                    return Err(CodecError::MalformedItem {
                        needed: length,
                        available: body.len(),
                    });
                }
                let raw = &body[..length];
                let item = decode_scalar(fmt, raw)?;
                Ok((item, header_len + length))
            }
        }
    }
}

fn decode_scalar(fmt: u8, raw: &[u8]) -> Result<Item> {
    match fmt {
        FMT_ASCII => {
            if !raw.is_ascii() {
                return Err(CodecError::NotAscii);
            }
            Ok(Item::Ascii(String::from_utf8_lossy(raw).into_owned()))
        }
        FMT_BINARY => Ok(Item::Binary(raw.to_vec())),
        FMT_BOOLEAN => Ok(Item::Boolean(raw.iter().map(|&b| b != 0).collect())),
        FMT_I1 => Ok(Item::I1(raw.iter().map(|&b| b as i8).collect())),
        FMT_U1 => Ok(Item::U1(raw.to_vec())),
        FMT_I2 => Ok(Item::I2(chunked(raw, 2, |c| i16::from_be_bytes([c[0], c[1]]))?)),
        FMT_U2 => Ok(Item::U2(chunked(raw, 2, |c| u16::from_be_bytes([c[0], c[1]]))?)),
        FMT_I4 => Ok(Item::I4(chunked(raw, 4, |c| {
            i32::from_be_bytes(c.try_into().unwrap())
        })?)),
        FMT_U4 => Ok(Item::U4(chunked(raw, 4, |c| {
            u32::from_be_bytes(c.try_into().unwrap())
        })?)),
        FMT_F4 => Ok(Item::F4(chunked(raw, 4, |c| {
            f32::from_be_bytes(c.try_into().unwrap())
        })?)),
        FMT_I8 => Ok(Item::I8(chunked(raw, 8, |c| {
            i64::from_be_bytes(c.try_into().unwrap())
        })?)),
        FMT_U8 => Ok(Item::U8(chunked(raw, 8, |c| {
            u64::from_be_bytes(c.try_into().unwrap())
        })?)),
        FMT_F8 => Ok(Item::F8(chunked(raw, 8, |c| {
            f64::from_be_bytes(c.try_into().unwrap())
        })?)),
        other => Err(CodecError::UnknownFormatCode(other)),
    }
}

fn chunked<T>(raw: &[u8], width: usize, f: impl Fn(&[u8]) -> T) -> Result<Vec<T>> {
    if raw.len() % width != 0 {
        return Err(CodecError::MisalignedNumericBody(raw.len()));
    }
    Ok(raw.chunks_exact(width).map(f).collect())
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    if len <= 0xFF {
        vec![bytes[7]]
    } else if len <= 0xFFFF {
        vec![bytes[6], bytes[7]]
    } else {
        vec![bytes[5], bytes[6], bytes[7]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(item: Item) {
        let encoded = item.encode().expect("encode");
        let (decoded, consumed) = Item::decode(&encoded).expect("decode");
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, item);
    }

    #[test]
    fn roundtrips_every_primitive() {
        roundtrip(Item::List(vec![]));
        roundtrip(Item::Ascii("AIMFAB".to_string()));
        roundtrip(Item::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]));
        roundtrip(Item::Boolean(vec![true, false, true]));
        roundtrip(Item::I1(vec![-1, 0, 1, 127]));
        roundtrip(Item::I2(vec![-30000, 30000]));
        roundtrip(Item::I4(vec![i32::MIN, i32::MAX]));
        roundtrip(Item::I8(vec![i64::MIN, i64::MAX]));
        roundtrip(Item::U1(vec![0, 255]));
        roundtrip(Item::U2(vec![0, 65535]));
        roundtrip(Item::U4(vec![0, u32::MAX, 720, 721]));
        roundtrip(Item::U8(vec![0, u64::MAX]));
        roundtrip(Item::F4(vec![1.5, -2.25]));
        roundtrip(Item::F8(vec![3.14159, -0.0]));
    }

    #[test]
    fn roundtrips_nested_lists() {
        roundtrip(Item::List(vec![
            Item::u4(1000),
            Item::List(vec![Item::u4(720), Item::u4(721)]),
        ]));
    }

    #[test]
    fn empty_list_has_no_body() {
        let encoded = Item::List(vec![]).encode().unwrap();
        assert_eq!(encoded, vec![FMT_LIST | 1, 0x00]);
    }

    #[test]
    fn decode_rejects_length_overrun_before_allocating() {
        // Format byte claims a U4 item of length 0xFFFFFF bytes, but the buffer is empty.
        let buf = [FMT_U4 | 3, 0xFF, 0xFF, 0xFF];
        let err = Item::decode(&buf).unwrap_err();
        assert!(matches!(err, CodecError::MalformedItem { .. }));
    }

    #[test]
    fn decode_rejects_nesting_too_deep() {
        let mut buf = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH + 1 {
            buf.push(FMT_LIST | 1);
            buf.push(0x01);
        }
        buf.push(FMT_LIST | 1);
        buf.push(0x00);
        let err = Item::decode(&buf).unwrap_err();
        assert_eq!(err, CodecError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    #[test]
    fn decode_rejects_bad_format_code() {
        let buf = [0x10 | 1, 0x00];
        let err = Item::decode(&buf).unwrap_err();
        assert_eq!(err, CodecError::UnknownFormatCode(0x10));
    }

    #[test]
    fn decode_rejects_misaligned_numeric_body() {
        let buf = [FMT_U4 | 1, 0x03, 0x00, 0x00, 0x00];
        let err = Item::decode(&buf).unwrap_err();
        assert_eq!(err, CodecError::MisalignedNumericBody(3));
    }
}
