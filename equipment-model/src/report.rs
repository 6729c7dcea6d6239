use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use secs2::Item;

use crate::registry::Registry;

/// DRACK values for S2F34, per §4.7/§6.
pub const DRACK_OK: u8 = 0;
pub const DRACK_INSUFFICIENT_SPACE: u8 = 1;
pub const DRACK_INVALID_FORMAT: u8 = 2;
pub const DRACK_REPORT_IN_USE: u8 = 3;
pub const DRACK_UNKNOWN_VID: u8 = 4;

/// LRACK values for S2F36.
pub const LRACK_OK: u8 = 0;
pub const LRACK_UNKNOWN_CEID: u8 = 4;
pub const LRACK_UNKNOWN_RPTID: u8 = 5;

/// ERACK values for S2F38.
pub const ERACK_OK: u8 = 0;
pub const ERACK_DENIED: u8 = 1;

/// A fully materialized event report, ready to be nested inside an S6F11 payload.
pub struct MaterializedReport {
    pub rptid: u32,
    pub items: Vec<Item>,
}

/// Holds report definitions (RPTID → [VID]) and event linkages (CEID → [RPTID]), per §4.7.
/// Separate from the CEID enable bit, which lives on `CeidEntry` in the `Registry` (§4.6) — a
/// trigger consults both.
pub struct ReportEngine {
    reports: RwLock<HashMap<u32, Vec<u32>>>,
    linkages: RwLock<HashMap<u32, Vec<u32>>>,
    next_dataid: AtomicU32,
}

impl Default for ReportEngine {
    fn default() -> ReportEngine {
        ReportEngine {
            reports: RwLock::new(HashMap::new()),
            linkages: RwLock::new(HashMap::new()),
            next_dataid: AtomicU32::new(1),
        }
    }
}

impl ReportEngine {
    pub fn new() -> ReportEngine {
        ReportEngine::default()
    }

    /// Empties both tables, as happens at every fresh `Communicating` transition (§3 Lifecycle).
    pub fn clear(&self) {
        self.reports.write().unwrap().clear();
        self.linkages.write().unwrap().clear();
    }

    /// S2F33 DefineReport for a single `(rptid, vids)` pair. `registry` is consulted to validate
    /// that every vid is a registered SVID or ECID.
    pub fn define_report(&self, registry: &Registry, rptid: u32, vids: Vec<u32>) -> u8 {
        if rptid == 0 && vids.is_empty() {
            self.reports.write().unwrap().clear();
            self.linkages.write().unwrap().clear();
            return DRACK_OK;
        }
        if vids.is_empty() {
            let linked = self
                .linkages
                .read()
                .unwrap()
                .values()
                .any(|rptids| rptids.contains(&rptid));
            if linked {
                return DRACK_REPORT_IN_USE;
            }
            self.reports.write().unwrap().remove(&rptid);
            return DRACK_OK;
        }
        if !vids.iter().all(|v| registry.svid_exists(*v) || registry.ecid(*v).is_ok()) {
            return DRACK_UNKNOWN_VID;
        }
        self.reports.write().unwrap().insert(rptid, vids);
        DRACK_OK
    }

    /// S2F35 LinkEventReport for a single `(ceid, rptids)` pair.
    pub fn link_event_report(&self, registry: &Registry, ceid: u32, rptids: Vec<u32>) -> u8 {
        if !registry.ceid_exists(ceid) {
            return LRACK_UNKNOWN_CEID;
        }
        if rptids.is_empty() {
            self.linkages.write().unwrap().remove(&ceid);
            return LRACK_OK;
        }
        let known = self.reports.read().unwrap();
        if !rptids.iter().all(|r| known.contains_key(r)) {
            return LRACK_UNKNOWN_RPTID;
        }
        drop(known);
        self.linkages.write().unwrap().insert(ceid, rptids);
        LRACK_OK
    }

    pub fn report_exists(&self, rptid: u32) -> bool {
        self.reports.read().unwrap().contains_key(&rptid)
    }

    /// Builds the reports linked to `ceid`, in linkage order, snapshotting each vid's current
    /// value from `registry`. Returns `None` if the CEID is disabled or has no linkage — a
    /// silent no-op per §4.7's `Trigger`.
    pub fn trigger(&self, registry: &Registry, ceid: u32) -> Option<(u32, Vec<MaterializedReport>)> {
        let enabled = registry.ceid(ceid).map(|e| e.enabled).unwrap_or(false);
        if !enabled {
            return None;
        }
        let rptids = self.linkages.read().unwrap().get(&ceid).cloned()?;
        if rptids.is_empty() {
            return None;
        }
        let reports_map = self.reports.read().unwrap();
        let mut out = Vec::with_capacity(rptids.len());
        for rptid in rptids {
            let Some(vids) = reports_map.get(&rptid) else {
                continue;
            };
            let items = vids
                .iter()
                .map(|vid| registry.value_of(*vid).unwrap_or(Item::Boolean(vec![false])))
                .collect();
            out.push(MaterializedReport { rptid, items });
        }
        let dataid = self.next_dataid.fetch_add(1, Ordering::Relaxed);
        Some((dataid, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ceid::CeidEntry;
    use crate::svid::SvidEntry;

    fn registry_with_vids() -> Registry {
        let reg = Registry::new();
        reg.bootstrap_svids(vec![
            SvidEntry::new(720, "ControlMode", Item::U1(vec![1]), false),
            SvidEntry::new(721, "ControlState", Item::U1(vec![4]), false),
        ]);
        reg.bootstrap_ceids(vec![CeidEntry::new(200, "ControlStateChange", false)]);
        reg
    }

    #[test]
    fn define_link_enable_trigger_round_trip() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        assert_eq!(engine.define_report(&reg, 1000, vec![720, 721]), DRACK_OK);
        assert_eq!(engine.link_event_report(&reg, 200, vec![1000]), LRACK_OK);
        reg.set_ceid_enabled(200, true).unwrap();
        let (dataid, reports) = engine.trigger(&reg, 200).unwrap();
        assert_eq!(dataid, 1);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rptid, 1000);
        assert_eq!(reports[0].items, vec![Item::U1(vec![1]), Item::U1(vec![4])]);
    }

    #[test]
    fn trigger_disabled_ceid_is_noop() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        engine.define_report(&reg, 1000, vec![720]);
        engine.link_event_report(&reg, 200, vec![1000]);
        assert!(engine.trigger(&reg, 200).is_none());
    }

    #[test]
    fn define_report_with_unknown_vid_is_rejected() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        assert_eq!(engine.define_report(&reg, 1000, vec![999]), DRACK_UNKNOWN_VID);
    }

    #[test]
    fn delete_report_still_linked_is_rejected() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        engine.define_report(&reg, 1000, vec![720]);
        engine.link_event_report(&reg, 200, vec![1000]);
        assert_eq!(engine.define_report(&reg, 1000, vec![]), DRACK_REPORT_IN_USE);
    }

    #[test]
    fn rptid_zero_with_empty_vids_clears_everything() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        engine.define_report(&reg, 1000, vec![720]);
        engine.link_event_report(&reg, 200, vec![1000]);
        assert_eq!(engine.define_report(&reg, 0, vec![]), DRACK_OK);
        assert!(!engine.report_exists(1000));
        reg.set_ceid_enabled(200, true).unwrap();
        assert!(engine.trigger(&reg, 200).is_none());
    }

    #[test]
    fn link_unknown_ceid_is_rejected() {
        let reg = registry_with_vids();
        let engine = ReportEngine::new();
        assert_eq!(engine.link_event_report(&reg, 9999, vec![]), LRACK_UNKNOWN_CEID);
    }
}
