//! Equipment-initiated primaries: S6F11 (event report) and S5F1 (alarm report), built from the
//! `equipment-model` engines' outputs per §4.7/§4.9 and §8 scenarios 2 and 5. Building the item
//! shape is separated from sending it (`Dispatcher::prepare_outbound` + `await_reply` own that),
//! matching §9's "handlers do not call into the dispatcher directly."

use equipment_model::{AlarmReport, MaterializedReport};
use secs2::Item;

/// `S6F11` body: `[dataid, ceid, [[rptid, [item…]], …]]`, per §8 scenario 2.
pub fn s6f11_item(dataid: u32, ceid: u32, reports: &[MaterializedReport]) -> Item {
    let rows = reports
        .iter()
        .map(|r| Item::List(vec![Item::u4(r.rptid), Item::List(r.items.clone())]))
        .collect();
    Item::List(vec![Item::u4(dataid), Item::u4(ceid), Item::List(rows)])
}

/// `S5F1` body: `[ALCD, ALID, ALTX]`, per §8 scenario 5. `ALTX` is empty on a clear (the engine
/// never carries clear-time text).
pub fn s5f1_item(report: &AlarmReport) -> Item {
    Item::List(vec![
        Item::U1(vec![report.alcd]),
        Item::u4(report.alid),
        Item::Ascii(report.altx.clone().unwrap_or_default()),
    ])
}
