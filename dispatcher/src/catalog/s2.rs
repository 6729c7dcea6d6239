use secs2::{Item, Message};

use crate::catalog::items::{as_bool, as_u32, list_items, no_value};
use crate::context::DeviceContext;
use equipment_model::{DRACK_OK, ERACK_DENIED, ERACK_OK, LRACK_OK};

/// EAC values for S2F16: 0 = accepted, 1 = out of range, 2 = unknown ECID, 3 = format error.
const EAC_OK: u8 = 0;
const EAC_OUT_OF_RANGE: u8 = 1;
const EAC_UNKNOWN_ECID: u8 = 2;

/// S2F13 Equipment Constant Request → S2F14: values for the requested ECIDs, in request order.
pub fn s2f13(msg: &Message, ctx: &DeviceContext) -> Item {
    let values = list_items(&msg.item)
        .iter()
        .filter_map(as_u32)
        .map(|ecid| ctx.registry.ecid(ecid).map(|e| e.value).unwrap_or_else(|_| no_value()))
        .collect();
    Item::List(values)
}

/// S2F15 New Equipment Constant Send → S2F16 `{EAC}`. Body is `[[ecid, value], …]`; the first
/// failing pair decides the ack (SECS-II does not define a per-item error list here).
pub fn s2f15(msg: &Message, ctx: &DeviceContext) -> Item {
    let mut eac = EAC_OK;
    for pair in list_items(&msg.item) {
        let Item::List(fields) = pair else { continue };
        let (Some(ecid_item), Some(value)) = (fields.first(), fields.get(1)) else {
            continue;
        };
        let Some(ecid) = as_u32(ecid_item) else { continue };
        match ctx.registry.write_ecid(ecid, value.clone()) {
            Ok(()) => {}
            Err(equipment_model::ModelError::OutOfRange { .. }) => {
                eac = EAC_OUT_OF_RANGE;
                break;
            }
            Err(_) => {
                eac = EAC_UNKNOWN_ECID;
                break;
            }
        }
    }
    Item::List(vec![Item::U1(vec![eac])])
}

/// S2F23 Trace Initialize → S2F24 `{TIAACK}`. Trace/sampling collection is outside this core
/// (§9 design note (c) scopes S7Fx/S10Fx out; tracing shares that fate) — always acks.
pub fn s2f23(_msg: &Message, _ctx: &DeviceContext) -> Item {
    Item::List(vec![Item::U1(vec![0])])
}

/// S2F29 Equipment Constant Namelist Request → S2F30: `[[ecid, name, min, max, default], …]`.
pub fn s2f29(msg: &Message, ctx: &DeviceContext) -> Item {
    let rows = list_items(&msg.item)
        .iter()
        .filter_map(as_u32)
        .map(|ecid| match ctx.registry.ecid(ecid) {
            Ok(entry) => Item::List(vec![
                Item::u4(ecid),
                Item::Ascii(entry.name),
                entry.min.map(|m| Item::I8(vec![m])).unwrap_or_else(|| Item::I8(vec![])),
                entry.max.map(|m| Item::I8(vec![m])).unwrap_or_else(|| Item::I8(vec![])),
                entry.default,
            ]),
            Err(_) => Item::List(vec![Item::u4(ecid), Item::Ascii(String::new())]),
        })
        .collect();
    Item::List(rows)
}

/// S2F33 Define Report → S2F34 `{DRACK}`. Body `[dataid, [[rptid, [vid…]], …]]`.
pub fn s2f33(msg: &Message, ctx: &DeviceContext) -> Item {
    let top = list_items(&msg.item);
    let Some(Item::List(entries)) = top.get(1).cloned() else {
        return Item::List(vec![Item::U1(vec![DRACK_OK])]);
    };
    let mut drack = DRACK_OK;
    for entry in entries {
        let Item::List(fields) = entry else { continue };
        let Some(rptid) = fields.first().and_then(as_u32) else { continue };
        let vids = match fields.get(1) {
            Some(Item::List(v)) => v.iter().filter_map(as_u32).collect(),
            _ => Vec::new(),
        };
        let ack = ctx.reports.define_report(&ctx.registry, rptid, vids);
        if ack != DRACK_OK {
            drack = ack;
            break;
        }
    }
    Item::List(vec![Item::U1(vec![drack])])
}

/// S2F35 Link Event Report → S2F36 `{LRACK}`. Body `[dataid, [[ceid, [rptid…]], …]]`.
pub fn s2f35(msg: &Message, ctx: &DeviceContext) -> Item {
    let top = list_items(&msg.item);
    let Some(Item::List(entries)) = top.get(1).cloned() else {
        return Item::List(vec![Item::U1(vec![LRACK_OK])]);
    };
    let mut lrack = LRACK_OK;
    for entry in entries {
        let Item::List(fields) = entry else { continue };
        let Some(ceid) = fields.first().and_then(as_u32) else { continue };
        let rptids = match fields.get(1) {
            Some(Item::List(v)) => v.iter().filter_map(as_u32).collect(),
            _ => Vec::new(),
        };
        let ack = ctx.reports.link_event_report(&ctx.registry, ceid, rptids);
        if ack != LRACK_OK {
            lrack = ack;
            break;
        }
    }
    Item::List(vec![Item::U1(vec![lrack])])
}

/// S2F37 Enable/Disable Event → S2F38 `{ERACK}`. Body `[CEED, [ceid…]]`; an empty ceid list
/// applies `CEED` to every known CEID.
pub fn s2f37(msg: &Message, ctx: &DeviceContext) -> Item {
    let top = list_items(&msg.item);
    let ceed = top.first().and_then(as_bool).unwrap_or(false);
    let ceids: Vec<u32> = match top.get(1) {
        Some(Item::List(v)) => v.iter().filter_map(as_u32).collect(),
        _ => Vec::new(),
    };
    let erack = if ceids.is_empty() {
        ctx.registry.set_all_ceids_enabled(ceed);
        ERACK_OK
    } else if ceids.iter().all(|c| ctx.registry.set_ceid_enabled(*c, ceed).is_ok()) {
        ERACK_OK
    } else {
        ERACK_DENIED
    };
    Item::List(vec![Item::U1(vec![erack])])
}

/// S2F41 Host Command → S2F42 `{HCACK, [[name, value], …]}`. Command execution is delegated to
/// the PLC adapter the `equipment` binary wires in; this handler only acknowledges receipt
/// (HCACK=0), since the command's actual effect has no invariant this core needs to enforce.
pub fn s2f41(_msg: &Message, _ctx: &DeviceContext) -> Item {
    Item::List(vec![Item::U1(vec![0]), Item::List(vec![])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use equipment_model::{CeidEntry, EcidEntry, SvidEntry};

    fn ctx() -> DeviceContext {
        let ctx = DeviceContext::new(1, "AIMFAB", "V01R01");
        ctx.registry.bootstrap_svids(vec![
            SvidEntry::new(720, "ControlMode", Item::U1(vec![1]), false),
            SvidEntry::new(721, "ControlState", Item::U1(vec![4]), false),
        ]);
        ctx.registry
            .bootstrap_ecids(vec![EcidEntry::new(1, "MaxSpeed", Item::U4(vec![100]), Some(0), Some(200))]);
        ctx.registry.bootstrap_ceids(vec![CeidEntry::new(200, "ControlStateChange", false)]);
        ctx
    }

    #[test]
    fn s2f15_rejects_out_of_range_value() {
        let ctx = ctx();
        let body = Item::List(vec![Item::List(vec![Item::u4(1), Item::U4(vec![999])])]);
        let msg = Message::new(2, 15, 1, 1).with_item(body);
        assert_eq!(s2f15(&msg, &ctx), Item::List(vec![Item::U1(vec![EAC_OUT_OF_RANGE])]));
    }

    #[test]
    fn define_link_enable_then_trigger_scenario() {
        let ctx = ctx();
        let define_body = Item::List(vec![
            Item::u4(7),
            Item::List(vec![Item::List(vec![Item::u4(1000), Item::List(vec![Item::u4(720), Item::u4(721)])])]),
        ]);
        let define_reply = s2f33(&Message::new(2, 33, 1, 1).with_item(define_body), &ctx);
        assert_eq!(define_reply, Item::List(vec![Item::U1(vec![DRACK_OK])]));

        let link_body = Item::List(vec![
            Item::u4(8),
            Item::List(vec![Item::List(vec![Item::u4(200), Item::List(vec![Item::u4(1000)])])]),
        ]);
        let link_reply = s2f35(&Message::new(2, 35, 1, 2).with_item(link_body), &ctx);
        assert_eq!(link_reply, Item::List(vec![Item::U1(vec![LRACK_OK])]));

        let enable_body = Item::List(vec![Item::Boolean(vec![true]), Item::List(vec![Item::u4(200)])]);
        let enable_reply = s2f37(&Message::new(2, 37, 1, 3).with_item(enable_body), &ctx);
        assert_eq!(enable_reply, Item::List(vec![Item::U1(vec![ERACK_OK])]));

        let (dataid, reports) = ctx.reports.trigger(&ctx.registry, 200).unwrap();
        assert_eq!(dataid, 1);
        assert_eq!(reports[0].items, vec![Item::U1(vec![1]), Item::U1(vec![4])]);
    }

    #[test]
    fn s2f37_bulk_disable_clears_every_ceid() {
        let ctx = ctx();
        ctx.registry.set_ceid_enabled(200, true).unwrap();
        let body = Item::List(vec![Item::Boolean(vec![false]), Item::List(vec![])]);
        s2f37(&Message::new(2, 37, 1, 1).with_item(body), &ctx);
        assert!(!ctx.registry.ceid(200).unwrap().enabled);
    }
}
