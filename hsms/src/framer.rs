use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::error::HsmsError;
use crate::error::Result;
use crate::frame::decode;
use crate::frame::encode;
use crate::frame::Frame;

/// Frame length cap, per §4.2: "declared length > configured cap, default 16 MiB".
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct FramerConfig {
    pub max_frame_len: u32,
    pub t8: Duration,
}

impl Default for FramerConfig {
    fn default() -> FramerConfig {
        FramerConfig {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            t8: Duration::from_secs(5),
        }
    }
}

/// Reads one HSMS frame off `reader`, enforcing the T8 inter-byte timer across the whole read
/// (length prefix and header+body): any gap between successive reads longer than `cfg.t8`
/// fails with `T8Expired`, and TCP closing mid-frame fails with `ShortRead`.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R, cfg: &FramerConfig) -> Result<Frame> {
    let mut len_buf = [0u8; 4];
    read_with_t8(reader, &mut len_buf, cfg.t8).await?;
    let declared = u32::from_be_bytes(len_buf);
    if declared > cfg.max_frame_len {
        return Err(HsmsError::LengthOverflow {
            declared,
            cap: cfg.max_frame_len,
        });
    }
    if declared < 10 {
        return Err(HsmsError::MalformedHeader);
    }

    let mut body = vec![0u8; declared as usize];
    read_with_t8(reader, &mut body, cfg.t8).await?;
    decode(&body)
}

/// Writes one HSMS frame to `writer`.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let wire = encode(frame)?;
    writer.write_all(&wire).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_with_t8<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
    t8: Duration,
) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let read_result = tokio::time::timeout(t8, reader.read(&mut buf[filled..])).await;
        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(HsmsError::Io(e)),
            Err(_) => return Err(HsmsError::T8Expired),
        };
        if n == 0 {
            return Err(HsmsError::ShortRead {
                wanted: buf.len(),
                got: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ControlMessage;
    use crate::frame::ControlType;
    use secs2::Item;
    use secs2::Message;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_back_a_written_frame() {
        let msg = Message::new(1, 13, 7, 100)
            .with_reply_expected(true)
            .with_item(Item::u4(42));
        let frame = Frame::Data(msg.clone());
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let cfg = FramerConfig::default();
        let decoded = read_frame(&mut cursor, &cfg).await.unwrap();
        assert_eq!(decoded, Frame::Data(msg));
    }

    #[tokio::test]
    async fn reads_back_a_control_frame() {
        let cm = ControlMessage::new(7, 5, ControlType::SelectReq);
        let frame = Frame::Control(cm.clone());
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let cfg = FramerConfig::default();
        let decoded = read_frame(&mut cursor, &cfg).await.unwrap();
        assert_eq!(decoded, Frame::Control(cm));
    }

    #[tokio::test]
    async fn rejects_oversized_declared_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(DEFAULT_MAX_FRAME_LEN + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        let cfg = FramerConfig::default();
        let err = read_frame(&mut cursor, &cfg).await.unwrap_err();
        assert!(matches!(err, HsmsError::LengthOverflow { .. }));
    }

    #[tokio::test]
    async fn short_read_mid_frame_is_reported() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&20u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 5]); // less than the declared 20 bytes, then EOF
        let mut cursor = Cursor::new(buf);
        let cfg = FramerConfig::default();
        let err = read_frame(&mut cursor, &cfg).await.unwrap_err();
        assert!(matches!(err, HsmsError::ShortRead { .. }));
    }
}
