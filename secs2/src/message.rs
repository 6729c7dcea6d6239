use crate::item::Item;

/// A SECS-II primary or reply message: `(stream, function, system-bytes, device-id)` plus an
/// optional root item. `w` is the "reply expected" flag carried in the high bit of the wire
/// stream byte; it is kept as a separate field here so `stream` always reads as the plain
/// 0-127 stream number from the message catalog in the spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub stream: u8,
    pub function: u8,
    pub w: bool,
    pub system_bytes: u32,
    pub device_id: u16,
    pub item: Option<Item>,
}

impl Message {
    pub fn new(stream: u8, function: u8, device_id: u16, system_bytes: u32) -> Message {
        Message {
            stream,
            function,
            w: false,
            system_bytes,
            device_id,
            item: None,
        }
    }

    pub fn with_reply_expected(mut self, w: bool) -> Message {
        self.w = w;
        self
    }

    pub fn with_item(mut self, item: Item) -> Message {
        self.item = Some(item);
        self
    }

    /// `(stream, function)` as used to key the dispatcher's handler table.
    pub fn sf(&self) -> (u8, u8) {
        (self.stream, self.function)
    }

    /// Builds the reply this primary expects: same stream (so `S2F33` replies `S2F34`), the
    /// matching function (primary + 1 by SECS-II convention), the primary's system bytes
    /// preserved for correlation, `w = false` (replies never themselves expect a reply).
    pub fn reply(&self, item: Option<Item>) -> Message {
        Message {
            stream: self.stream,
            function: self.function + 1,
            w: false,
            system_bytes: self.system_bytes,
            device_id: self.device_id,
            item,
        }
    }
}
