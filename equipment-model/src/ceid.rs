/// A collection event: `{name, enabled?}` (§3 "CEID"). Default `enabled = false` except for a
/// configured bootstrap set (the `equipment` binary crate decides that set from its config file).
#[derive(Debug, Clone)]
pub struct CeidEntry {
    pub ceid: u32,
    pub name: String,
    pub enabled: bool,
}

impl CeidEntry {
    pub fn new(ceid: u32, name: impl Into<String>, enabled: bool) -> CeidEntry {
        CeidEntry {
            ceid,
            name: name.into(),
            enabled,
        }
    }
}
