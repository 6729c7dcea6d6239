use secs2::Item;

/// A status variable: `{name, data-type, current-value, read-only?}` (§3 "SVID").
/// `data-type` is implicit in the `Item` variant carried by `value`.
#[derive(Debug, Clone)]
pub struct SvidEntry {
    pub svid: u32,
    pub name: String,
    pub value: Item,
    pub read_only: bool,
}

impl SvidEntry {
    pub fn new(svid: u32, name: impl Into<String>, value: Item, read_only: bool) -> SvidEntry {
        SvidEntry {
            svid,
            name: name.into(),
            value,
            read_only,
        }
    }
}
