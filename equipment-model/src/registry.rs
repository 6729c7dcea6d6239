use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secs2::Item;

use crate::alid::AlidEntry;
use crate::ceid::CeidEntry;
use crate::ecid::EcidEntry;
use crate::error::ModelError;
use crate::svid::SvidEntry;

/// Notified with `(id, old, new)` on every committed write to an SVID or ECID, per §4.6. The
/// report/event engine is the primary consumer (it re-triggers linked CEIDs on change-data
/// capture); the `equipment` binary may attach more for logging or persistence.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, vid: u32, old: &Item, new: &Item);
}

/// The per-device typed registry of §4.6: SVIDs, ECIDs, ALIDs, CEIDs. One `RwLock` per map gives
/// concurrent readers and a single serialized writer per entity kind, matching the "single mutex
/// per map, OR a per-entity lock" guidance — we take the simpler per-map form since writes are
/// rare (host reconfiguration, PLC-driven status change) relative to reads.
#[derive(Default)]
pub struct Registry {
    svids: RwLock<HashMap<u32, SvidEntry>>,
    ecids: RwLock<HashMap<u32, EcidEntry>>,
    alids: RwLock<HashMap<u32, AlidEntry>>,
    ceids: RwLock<HashMap<u32, CeidEntry>>,
    observers: RwLock<Vec<Arc<dyn ChangeObserver>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn bootstrap_svids(&self, entries: Vec<SvidEntry>) {
        let mut map = self.svids.write().unwrap();
        for e in entries {
            map.insert(e.svid, e);
        }
    }

    pub fn bootstrap_ecids(&self, entries: Vec<EcidEntry>) {
        let mut map = self.ecids.write().unwrap();
        for e in entries {
            map.insert(e.ecid, e);
        }
    }

    pub fn bootstrap_alids(&self, entries: Vec<AlidEntry>) {
        let mut map = self.alids.write().unwrap();
        for e in entries {
            map.insert(e.alid, e);
        }
    }

    pub fn bootstrap_ceids(&self, entries: Vec<CeidEntry>) {
        let mut map = self.ceids.write().unwrap();
        for e in entries {
            map.insert(e.ceid, e);
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn ChangeObserver>) {
        self.observers.write().unwrap().push(observer);
    }

    fn notify(&self, id: u32, old: &Item, new: &Item) {
        for obs in self.observers.read().unwrap().iter() {
            obs.on_change(id, old, new);
        }
    }

    pub fn svid(&self, svid: u32) -> Result<SvidEntry, ModelError> {
        self.svids
            .read()
            .unwrap()
            .get(&svid)
            .cloned()
            .ok_or(ModelError::UnknownSvid(svid))
    }

    pub fn write_svid(&self, svid: u32, new_value: Item) -> Result<(), ModelError> {
        let mut map = self.svids.write().unwrap();
        let entry = map.get_mut(&svid).ok_or(ModelError::UnknownSvid(svid))?;
        if entry.read_only {
            return Err(ModelError::ReadOnly(svid));
        }
        let old = entry.value.clone();
        entry.value = new_value.clone();
        drop(map);
        self.notify(svid, &old, &new_value);
        Ok(())
    }

    pub fn ecid(&self, ecid: u32) -> Result<EcidEntry, ModelError> {
        self.ecids
            .read()
            .unwrap()
            .get(&ecid)
            .cloned()
            .ok_or(ModelError::UnknownEcid(ecid))
    }

    /// S2F15 New Equipment Constant Send. Returns `Err(OutOfRange)` (EAC=3 at the caller) if the
    /// new value violates `min`/`max`.
    pub fn write_ecid(&self, ecid: u32, new_value: Item) -> Result<(), ModelError> {
        let mut map = self.ecids.write().unwrap();
        let entry = map.get_mut(&ecid).ok_or(ModelError::UnknownEcid(ecid))?;
        if !entry.in_range(&new_value) {
            return Err(ModelError::OutOfRange {
                ecid,
                min: entry.min,
                max: entry.max,
            });
        }
        let old = entry.value.clone();
        entry.value = new_value.clone();
        drop(map);
        self.notify(ecid, &old, &new_value);
        Ok(())
    }

    /// VID = SVID ∪ ECID (glossary). Used by the report engine to materialize report items.
    pub fn value_of(&self, vid: u32) -> Result<Item, ModelError> {
        if let Ok(entry) = self.svid(vid) {
            return Ok(entry.value);
        }
        self.ecid(vid).map(|e| e.value)
    }

    pub fn alid(&self, alid: u32) -> Result<AlidEntry, ModelError> {
        self.alids
            .read()
            .unwrap()
            .get(&alid)
            .cloned()
            .ok_or(ModelError::UnknownAlid(alid))
    }

    /// `{alid | alid.active}`, the `AlarmsSet` SVID's value at every instant (§3, §4.9, §8
    /// scenario 5's active-set invariant).
    pub fn alids_active(&self) -> Vec<u32> {
        self.alids
            .read()
            .unwrap()
            .values()
            .filter(|e| e.active)
            .map(|e| e.alid)
            .collect()
    }

    /// `{alid | alid.enabled}`, the `AlarmsEnabled` SVID's value.
    pub fn alids_enabled(&self) -> Vec<u32> {
        self.alids
            .read()
            .unwrap()
            .values()
            .filter(|e| e.enabled)
            .map(|e| e.alid)
            .collect()
    }

    /// Returns `true` if this call flipped the alarm (edge), `false` if it was already active.
    pub fn set_alarm_active(&self, alid: u32, last_set_at: u64) -> Result<bool, ModelError> {
        let mut map = self.alids.write().unwrap();
        let entry = map.get_mut(&alid).ok_or(ModelError::UnknownAlid(alid))?;
        if entry.active {
            return Ok(false);
        }
        entry.active = true;
        entry.last_set_at = Some(last_set_at);
        Ok(true)
    }

    /// Returns `true` if this call cleared the alarm (edge), `false` if it was already inactive.
    pub fn clear_alarm_active(&self, alid: u32) -> Result<bool, ModelError> {
        let mut map = self.alids.write().unwrap();
        let entry = map.get_mut(&alid).ok_or(ModelError::UnknownAlid(alid))?;
        if !entry.active {
            return Ok(false);
        }
        entry.active = false;
        Ok(true)
    }

    pub fn ceid(&self, ceid: u32) -> Result<CeidEntry, ModelError> {
        self.ceids
            .read()
            .unwrap()
            .get(&ceid)
            .cloned()
            .ok_or(ModelError::UnknownCeid(ceid))
    }

    pub fn ceid_exists(&self, ceid: u32) -> bool {
        self.ceids.read().unwrap().contains_key(&ceid)
    }

    pub fn svid_exists(&self, svid: u32) -> bool {
        self.svids.read().unwrap().contains_key(&svid)
    }

    pub fn set_ceid_enabled(&self, ceid: u32, enabled: bool) -> Result<(), ModelError> {
        let mut map = self.ceids.write().unwrap();
        let entry = map.get_mut(&ceid).ok_or(ModelError::UnknownCeid(ceid))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub fn set_all_ceids_enabled(&self, enabled: bool) {
        for entry in self.ceids.write().unwrap().values_mut() {
            entry.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingObserver {
        seen: Mutex<Vec<(u32, Item, Item)>>,
    }

    impl ChangeObserver for RecordingObserver {
        fn on_change(&self, vid: u32, old: &Item, new: &Item) {
            self.seen.lock().unwrap().push((vid, old.clone(), new.clone()));
        }
    }

    #[test]
    fn write_svid_notifies_observer_with_old_and_new() {
        let reg = Registry::new();
        reg.bootstrap_svids(vec![SvidEntry::new(720, "ControlMode", Item::U1(vec![0]), false)]);
        let observer = Arc::new(RecordingObserver {
            seen: Mutex::new(Vec::new()),
        });
        reg.add_observer(observer.clone());
        reg.write_svid(720, Item::U1(vec![1])).unwrap();
        let seen = observer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (720, Item::U1(vec![0]), Item::U1(vec![1])));
    }

    #[test]
    fn write_to_read_only_svid_is_rejected() {
        let reg = Registry::new();
        reg.bootstrap_svids(vec![SvidEntry::new(1, "ReadOnly", Item::U1(vec![0]), true)]);
        assert_eq!(reg.write_svid(1, Item::U1(vec![1])), Err(ModelError::ReadOnly(1)));
    }

    #[test]
    fn ecid_write_out_of_range_is_rejected() {
        let reg = Registry::new();
        reg.bootstrap_ecids(vec![EcidEntry::new(1, "MaxSpeed", Item::U4(vec![100]), Some(0), Some(200))]);
        assert_eq!(
            reg.write_ecid(1, Item::U4(vec![500])),
            Err(ModelError::OutOfRange {
                ecid: 1,
                min: Some(0),
                max: Some(200)
            })
        );
        reg.write_ecid(1, Item::U4(vec![150])).unwrap();
        assert_eq!(reg.ecid(1).unwrap().value, Item::U4(vec![150]));
    }

    #[test]
    fn alarm_set_is_idempotent() {
        let reg = Registry::new();
        reg.bootstrap_alids(vec![AlidEntry::new(12001, "Door", "safety", 1)]);
        assert!(reg.set_alarm_active(12001, 1000).unwrap());
        assert!(!reg.set_alarm_active(12001, 2000).unwrap());
        assert_eq!(reg.alids_active(), vec![12001]);
        assert!(reg.clear_alarm_active(12001).unwrap());
        assert!(!reg.clear_alarm_active(12001).unwrap());
        assert!(reg.alids_active().is_empty());
    }

    #[test]
    fn alids_enabled_defaults_to_all_bootstrapped_alarms() {
        let reg = Registry::new();
        reg.bootstrap_alids(vec![
            AlidEntry::new(12001, "Door", "safety", 1),
            AlidEntry::new(12002, "Vacuum", "process", 2),
        ]);
        let mut enabled = reg.alids_enabled();
        enabled.sort_unstable();
        assert_eq!(enabled, vec![12001, 12002]);
    }

    #[test]
    fn value_of_checks_svid_then_ecid() {
        let reg = Registry::new();
        reg.bootstrap_svids(vec![SvidEntry::new(720, "ControlMode", Item::U1(vec![1]), false)]);
        reg.bootstrap_ecids(vec![EcidEntry::new(900, "MaxSpeed", Item::U4(vec![100]), None, None)]);
        assert_eq!(reg.value_of(720).unwrap(), Item::U1(vec![1]));
        assert_eq!(reg.value_of(900).unwrap(), Item::U4(vec![100]));
        assert_eq!(reg.value_of(1).unwrap_err(), ModelError::UnknownEcid(1));
    }
}
