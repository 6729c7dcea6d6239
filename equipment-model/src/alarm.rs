use crate::error::ModelError;
use crate::registry::Registry;

const ACTIVE_BIT: u8 = 0x80;

/// The `{ALCD, ALID, ALTX}` payload for an outbound S5F1, built on an alarm edge.
pub struct AlarmReport {
    pub alcd: u8,
    pub alid: u32,
    pub altx: Option<String>,
}

/// Stateless wrapper over `Registry`'s ALID map: the active-alarm state itself lives there
/// (§4.6), this just derives the S5F1 payload and idempotency on edges (§4.9).
pub struct AlarmEngine;

impl AlarmEngine {
    /// Transitions `alid` to active if it was inactive. Returns `None` if already active
    /// (idempotent no-op, per §4.9 and §8 scenario 5).
    pub fn set_alarm(
        registry: &Registry,
        alid: u32,
        text: Option<String>,
        now: u64,
    ) -> Result<Option<AlarmReport>, ModelError> {
        let became_active = registry.set_alarm_active(alid, now)?;
        if !became_active {
            return Ok(None);
        }
        let entry = registry.alid(alid)?;
        Ok(Some(AlarmReport {
            alcd: entry.priority | ACTIVE_BIT,
            alid,
            altx: text,
        }))
    }

    /// Transitions `alid` to inactive if it was active. Returns `None` if already inactive.
    pub fn clear_alarm(registry: &Registry, alid: u32) -> Result<Option<AlarmReport>, ModelError> {
        let entry = registry.alid(alid)?;
        let priority = entry.priority;
        let became_inactive = registry.clear_alarm_active(alid)?;
        if !became_inactive {
            return Ok(None);
        }
        Ok(Some(AlarmReport {
            alcd: priority & !ACTIVE_BIT,
            alid,
            altx: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alid::AlidEntry;

    fn registry_with_alarm() -> Registry {
        let reg = Registry::new();
        reg.bootstrap_alids(vec![AlidEntry::new(12001, "Door", "safety", 1)]);
        reg
    }

    #[test]
    fn set_alarm_emits_once_then_is_idempotent() {
        let reg = registry_with_alarm();
        let first = AlarmEngine::set_alarm(&reg, 12001, Some("Door open".into()), 1).unwrap();
        assert!(first.is_some());
        let report = first.unwrap();
        assert_eq!(report.alcd, 1 | ACTIVE_BIT);
        assert_eq!(report.altx.as_deref(), Some("Door open"));

        let second = AlarmEngine::set_alarm(&reg, 12001, Some("Door open".into()), 2).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn clear_alarm_emits_once_then_is_idempotent() {
        let reg = registry_with_alarm();
        AlarmEngine::set_alarm(&reg, 12001, None, 1).unwrap();
        let first = AlarmEngine::clear_alarm(&reg, 12001).unwrap();
        assert!(first.is_some());
        assert_eq!(first.unwrap().alcd, 1);

        let second = AlarmEngine::clear_alarm(&reg, 12001).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn unknown_alarm_is_an_error() {
        let reg = Registry::new();
        assert_eq!(
            AlarmEngine::set_alarm(&reg, 1, None, 1).unwrap_err(),
            ModelError::UnknownAlid(1)
        );
    }
}
