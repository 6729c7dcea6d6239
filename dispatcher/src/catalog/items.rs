use secs2::Item;

/// Unwraps a message body's top-level list, or an empty one if the body is absent or not a
/// list — several primaries in the catalog (§6) are valid with no body at all.
pub fn list_items(item: &Option<Item>) -> Vec<Item> {
    match item {
        Some(Item::List(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Single-element unsigned scalar, the common wire shape for a VID/CEID/RPTID/ALID.
pub fn as_u32(item: &Item) -> Option<u32> {
    match item {
        Item::U4(v) if v.len() == 1 => Some(v[0]),
        Item::U2(v) if v.len() == 1 => Some(v[0] as u32),
        Item::U1(v) if v.len() == 1 => Some(v[0] as u32),
        Item::I4(v) if v.len() == 1 && v[0] >= 0 => Some(v[0] as u32),
        _ => None,
    }
}

pub fn as_bool(item: &Item) -> Option<bool> {
    match item {
        Item::Boolean(v) if v.len() == 1 => Some(v[0]),
        _ => None,
    }
}

/// The "no value" sentinel substituted for an unknown vid in a status/constant reply, rather
/// than failing the whole reply.
pub fn no_value() -> Item {
    Item::Boolean(vec![false])
}
