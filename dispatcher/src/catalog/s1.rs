use gem::ControlState;
use secs2::{Item, Message};

use crate::catalog::items::{as_u32, list_items, no_value};
use crate::context::DeviceContext;

/// S1F1 Are You There → S1F2 On Line Data: `[MDLN, SOFTREV]`.
pub fn s1f1(_msg: &Message, ctx: &DeviceContext) -> Item {
    Item::List(vec![
        Item::Ascii(ctx.model_name.clone()),
        Item::Ascii(ctx.software_revision.clone()),
    ])
}

/// S1F3 Selected Equipment Status Request → S1F4: values for the requested SVIDs, in request
/// order. An empty request list returns an empty reply (the "request all" convenience some
/// hosts rely on is not implemented — see DESIGN.md). `DeviceContext::SVID_ALARMS_SET`/
/// `SVID_ALARMS_ENABLED` are reserved: they are answered live from the alarm engine instead of
/// a bootstrapped registry entry, so a host reading them always sees the current alarm state.
pub fn s1f3(msg: &Message, ctx: &DeviceContext) -> Item {
    let values = list_items(&msg.item)
        .iter()
        .filter_map(as_u32)
        .map(|svid| match svid {
            DeviceContext::SVID_ALARMS_SET => alid_list_item(ctx.registry.alids_active()),
            DeviceContext::SVID_ALARMS_ENABLED => alid_list_item(ctx.registry.alids_enabled()),
            _ => ctx.registry.value_of(svid).unwrap_or_else(|_| no_value()),
        })
        .collect();
    Item::List(values)
}

fn alid_list_item(alids: Vec<u32>) -> Item {
    Item::List(alids.into_iter().map(Item::u4).collect())
}

/// S1F11 Status Variable Namelist Request → S1F12: `[[svid, name, units], …]`. `units` is not
/// modeled on `SvidEntry` so it is always reported empty.
pub fn s1f11(msg: &Message, ctx: &DeviceContext) -> Item {
    let rows = list_items(&msg.item)
        .iter()
        .filter_map(as_u32)
        .map(|svid| match ctx.registry.svid(svid) {
            Ok(entry) => Item::List(vec![Item::u4(svid), Item::Ascii(entry.name), Item::Ascii(String::new())]),
            Err(_) => Item::List(vec![Item::u4(svid), Item::Ascii(String::new()), Item::Ascii(String::new())]),
        })
        .collect();
    Item::List(rows)
}

/// S1F13 Establish Communications Request → S1F14 `{COMMACK, [MDLN, SOFTREV]}`. Always accepts
/// (COMMACK=0): nothing in this equipment model ever refuses communications.
pub fn s1f13(_msg: &Message, ctx: &DeviceContext) -> Item {
    let _ = ctx.phase.lock().unwrap().on_comm_established(0);
    Item::List(vec![
        Item::U1(vec![0]),
        Item::List(vec![
            Item::Ascii(ctx.model_name.clone()),
            Item::Ascii(ctx.software_revision.clone()),
        ]),
    ])
}

/// S1F15 Request OFF-LINE → S1F16 `{OFLACK}`. Rejected (OFLACK=1) while a process run is
/// executing; otherwise always accepted.
pub fn s1f15(_msg: &Message, ctx: &DeviceContext) -> Item {
    let is_processing = matches!(
        ctx.process.lock().unwrap().state(),
        gem::ProcessState::Executing | gem::ProcessState::Paused | gem::ProcessState::Completing
    );
    let oflack = if is_processing {
        1u8
    } else {
        let transitioned = ctx.control.lock().unwrap().request_offline(false).is_ok();
        if transitioned {
            ctx.queue_event(DeviceContext::CEID_CONTROL_STATE_CHANGE);
        }
        0u8
    };
    Item::List(vec![Item::U1(vec![oflack])])
}

/// S1F17 Request ON-LINE → S1F18 `{ONLACK}`. `ONLACK=2` ("already online") when the control
/// machine is already past `AttemptOnline`; `ONLACK=0` on a fresh accept; `ONLACK=1` would be
/// "not able to" (never returned here — nothing in this model refuses to go online). A
/// host-driven Request ON-LINE lands `OnlineRemote` or `OnlineLocal` per the device's configured
/// `DefaultControlState` (`ctx.default_control_state`), not unconditionally remote — the host
/// reaching this primary over a Selected link does not by itself cede the local/remote switch.
pub fn s1f17(_msg: &Message, ctx: &DeviceContext) -> Item {
    let mut control = ctx.control.lock().unwrap();
    let onlack = if matches!(control.state(), ControlState::OnlineLocal | ControlState::OnlineRemote) {
        2u8
    } else {
        match control.request_online() {
            Ok(_) => {
                let _ = control.on_online_ack(0);
                let want_remote = ctx.default_control_state == gem::DefaultControlState::OnlineRemote;
                let _ = control.switch_local_remote(want_remote);
                0u8
            }
            Err(_) => 1u8,
        }
    };
    drop(control);
    if onlack == 0 {
        ctx.queue_event(DeviceContext::CEID_CONTROL_STATE_CHANGE);
    }
    if onlack == 0 || onlack == 2 {
        let _ = ctx.phase.lock().unwrap().on_online_ack(onlack);
    }
    Item::List(vec![Item::U1(vec![onlack])])
}
