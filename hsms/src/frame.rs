use secs2::Item;
use secs2::Message;

use crate::error::HsmsError;
use crate::error::Result;

/// Header byte 5 values (SEMI E37 `SType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    SelectReq,
    SelectRsp,
    DeselectReq,
    DeselectRsp,
    LinktestReq,
    LinktestRsp,
    RejectReq,
    SeparateReq,
}

impl ControlType {
    fn s_type(self) -> u8 {
        match self {
            ControlType::SelectReq => 1,
            ControlType::SelectRsp => 2,
            ControlType::DeselectReq => 3,
            ControlType::DeselectRsp => 4,
            ControlType::LinktestReq => 5,
            ControlType::LinktestRsp => 6,
            ControlType::RejectReq => 7,
            ControlType::SeparateReq => 9,
        }
    }

    fn from_s_type(s_type: u8) -> Result<ControlType> {
        Ok(match s_type {
            1 => ControlType::SelectReq,
            2 => ControlType::SelectRsp,
            3 => ControlType::DeselectReq,
            4 => ControlType::DeselectRsp,
            5 => ControlType::LinktestReq,
            6 => ControlType::LinktestRsp,
            7 => ControlType::RejectReq,
            9 => ControlType::SeparateReq,
            other => return Err(HsmsError::BadSType(other)),
        })
    }
}

/// A decoded HSMS control message (`s_type != 0`). `byte3` carries the select/deselect status
/// code for `*Rsp` variants, or the rejected s-type/stream for `RejectReq`; it is otherwise 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    pub session_id: u16,
    pub system_bytes: u32,
    pub ctrl: ControlType,
    pub byte3: u8,
}

impl ControlMessage {
    pub fn new(session_id: u16, system_bytes: u32, ctrl: ControlType) -> ControlMessage {
        ControlMessage {
            session_id,
            system_bytes,
            ctrl,
            byte3: 0,
        }
    }

    pub fn with_status(mut self, status: u8) -> ControlMessage {
        self.byte3 = status;
        self
    }
}

/// One HSMS frame: either a SECS-II data message or a control message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Data(Message),
    Control(ControlMessage),
}

/// Frames count header+body but not the leading length field itself.
pub fn encode(frame: &Frame) -> Result<Vec<u8>> {
    let mut header = [0u8; 10];
    let body: Vec<u8>;

    match frame {
        Frame::Data(msg) => {
            header[0..2].copy_from_slice(&msg.device_id.to_be_bytes());
            header[2] = msg.stream | if msg.w { 0x80 } else { 0x00 };
            header[3] = msg.function;
            header[4] = 0; // p-type, always 0
            header[5] = 0; // s-type, 0 = data message
            header[6..10].copy_from_slice(&msg.system_bytes.to_be_bytes());
            body = match &msg.item {
                Some(item) => item.encode()?,
                None => Vec::new(),
            };
        }
        Frame::Control(ctrl) => {
            header[0..2].copy_from_slice(&ctrl.session_id.to_be_bytes());
            header[2] = 0;
            header[3] = ctrl.byte3;
            header[4] = 0;
            header[5] = ctrl.ctrl.s_type();
            header[6..10].copy_from_slice(&ctrl.system_bytes.to_be_bytes());
            body = Vec::new();
        }
    }

    let length = (header.len() + body.len()) as u32;
    let mut out = Vec::with_capacity(4 + header.len() + body.len());
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes a frame from `header_and_body`, the bytes following the 4-byte length prefix
/// (exactly `length` bytes, as already validated and read by the framer).
pub fn decode(header_and_body: &[u8]) -> Result<Frame> {
    if header_and_body.len() < 10 {
        return Err(HsmsError::MalformedHeader);
    }
    let header = &header_and_body[0..10];
    let body = &header_and_body[10..];

    let session_id = u16::from_be_bytes([header[0], header[1]]);
    let byte2 = header[2];
    let byte3 = header[3];
    let s_type = header[5];
    let system_bytes = u32::from_be_bytes([header[6], header[7], header[8], header[9]]);

    if s_type == 0 {
        let item = if body.is_empty() {
            None
        } else {
            let (item, consumed) = Item::decode(body)?;
            if consumed != body.len() {
                log::warn!(
                    "data message body had {} trailing bytes after the root item",
                    body.len() - consumed
                );
            }
            Some(item)
        };
        let msg = Message {
            stream: byte2 & 0x7F,
            function: byte3,
            w: byte2 & 0x80 != 0,
            system_bytes,
            device_id: session_id,
            item,
        };
        Ok(Frame::Data(msg))
    } else {
        let ctrl = ControlType::from_s_type(s_type)?;
        Ok(Frame::Control(ControlMessage {
            session_id,
            system_bytes,
            ctrl,
            byte3,
        }))
    }
}
