//! Concrete per-(stream, function) handlers for the message catalog of §6. Each function is a
//! pure `(primary, context) -> reply item` mapping; the dispatch table in `crate::table` is what
//! gates admission and decides whether a reply is actually sent.

mod items;
mod s1;
mod s2;

use secs2::Message;

use crate::context::DeviceContext;

pub type HandlerFn = fn(&Message, &DeviceContext) -> secs2::Item;

/// The handler table of §4.8, keyed by `(stream, function)`.
pub fn handler_table() -> std::collections::HashMap<(u8, u8), HandlerFn> {
    let mut table: std::collections::HashMap<(u8, u8), HandlerFn> = std::collections::HashMap::new();
    table.insert((1, 1), s1::s1f1);
    table.insert((1, 3), s1::s1f3);
    table.insert((1, 11), s1::s1f11);
    table.insert((1, 13), s1::s1f13);
    table.insert((1, 15), s1::s1f15);
    table.insert((1, 17), s1::s1f17);
    table.insert((2, 13), s2::s2f13);
    table.insert((2, 15), s2::s2f15);
    table.insert((2, 23), s2::s2f23);
    table.insert((2, 29), s2::s2f29);
    table.insert((2, 33), s2::s2f33);
    table.insert((2, 35), s2::s2f35);
    table.insert((2, 37), s2::s2f37);
    table.insert((2, 41), s2::s2f41);
    table
}
