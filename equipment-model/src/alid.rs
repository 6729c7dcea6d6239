/// An alarm: `{name, category, priority, active?, enabled?, last-set-at}` (§3 "ALID").
/// `last_set_at` is a monotonic tick supplied by the caller (the dispatcher owns wall-clock
/// time); this crate never reads the clock itself. `enabled` defaults to `true` — every
/// bootstrapped alarm reports unless explicitly disabled.
#[derive(Debug, Clone)]
pub struct AlidEntry {
    pub alid: u32,
    pub name: String,
    pub category: String,
    pub priority: u8,
    pub active: bool,
    pub enabled: bool,
    pub last_set_at: Option<u64>,
}

impl AlidEntry {
    pub fn new(alid: u32, name: impl Into<String>, category: impl Into<String>, priority: u8) -> AlidEntry {
        AlidEntry {
            alid,
            name: name.into(),
            category: category.into(),
            priority,
            active: false,
            enabled: true,
            last_set_at: None,
        }
    }
}
