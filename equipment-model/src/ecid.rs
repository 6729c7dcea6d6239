use secs2::Item;

/// An equipment constant: `{name, data-type, current-value, min, max, default}` (§3 "ECID").
/// Bounds are only enforced for the integer-valued `Item` variants; `min`/`max` of `None` means
/// unbounded on that side.
#[derive(Debug, Clone)]
pub struct EcidEntry {
    pub ecid: u32,
    pub name: String,
    pub value: Item,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub default: Item,
}

impl EcidEntry {
    pub fn new(
        ecid: u32,
        name: impl Into<String>,
        default: Item,
        min: Option<i64>,
        max: Option<i64>,
    ) -> EcidEntry {
        EcidEntry {
            ecid,
            name: name.into(),
            value: default.clone(),
            min,
            max,
            default,
        }
    }

    /// Integer projection of a single-element numeric `Item`, used to check `min`/`max`.
    /// Non-numeric items, and multi-element arrays, are always in range (bounds only make sense
    /// for a scalar equipment constant).
    pub fn as_i64(item: &Item) -> Option<i64> {
        match item {
            Item::I1(v) if v.len() == 1 => Some(v[0] as i64),
            Item::I2(v) if v.len() == 1 => Some(v[0] as i64),
            Item::I4(v) if v.len() == 1 => Some(v[0] as i64),
            Item::I8(v) if v.len() == 1 => Some(v[0]),
            Item::U1(v) if v.len() == 1 => Some(v[0] as i64),
            Item::U2(v) if v.len() == 1 => Some(v[0] as i64),
            Item::U4(v) if v.len() == 1 => Some(v[0] as i64),
            Item::U8(v) if v.len() == 1 => i64::try_from(v[0]).ok(),
            _ => None,
        }
    }

    pub fn in_range(&self, candidate: &Item) -> bool {
        let Some(n) = EcidEntry::as_i64(candidate) else {
            return true;
        };
        if let Some(min) = self.min {
            if n < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return false;
            }
        }
        true
    }
}
