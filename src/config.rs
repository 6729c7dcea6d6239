//! The per-device bootstrap configuration of §6 "Configuration schema" and SPEC_FULL.md §3.1:
//! one TOML file, one `[[device]]` table per equipment instance, with nested arrays-of-tables
//! for the SVID/ECID/ALID/CEID bootstrap mappings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum Role {
    Passive,
    Active,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum DefaultControlState {
    OnlineLocal,
    OnlineRemote,
}

impl From<DefaultControlState> for gem::DefaultControlState {
    fn from(value: DefaultControlState) -> gem::DefaultControlState {
        match value {
            DefaultControlState::OnlineLocal => gem::DefaultControlState::OnlineLocal,
            DefaultControlState::OnlineRemote => gem::DefaultControlState::OnlineRemote,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SvidConfig {
    pub svid: u32,
    pub name: String,
    pub read_only: bool,
    #[serde(default)]
    pub default: SvidSeed,
}

/// A small JSON-compatible seed value for a bootstrap SVID/ECID, sidestepping the full `Item`
/// grammar in the config file format (TOML has no format-code concept); `into_item` below maps
/// it onto the wire type the field actually uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SvidSeed {
    U4(u32),
    I4(i32),
    F8(f64),
    Text(String),
    Flag(bool),
}

impl Default for SvidSeed {
    fn default() -> SvidSeed {
        SvidSeed::U4(0)
    }
}

impl SvidSeed {
    pub fn into_item(self) -> secs2::Item {
        match self {
            SvidSeed::U4(v) => secs2::Item::u4(v),
            SvidSeed::I4(v) => secs2::Item::I4(vec![v]),
            SvidSeed::F8(v) => secs2::Item::F8(vec![v]),
            SvidSeed::Text(v) => secs2::Item::Ascii(v),
            SvidSeed::Flag(v) => secs2::Item::Boolean(vec![v]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EcidConfig {
    pub ecid: u32,
    pub name: String,
    #[serde(default)]
    pub default: SvidSeed,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlidConfig {
    pub alid: u32,
    pub name: String,
    pub category: String,
    pub priority: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CeidConfig {
    pub ceid: u32,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub device_id: u16,
    pub role: Role,
    pub bind_or_connect: String,
    #[serde(default = "default_t3_ms")]
    pub t3_ms: u64,
    #[serde(default = "default_t5_ms")]
    pub t5_ms: u64,
    #[serde(default = "default_t6_ms")]
    pub t6_ms: u64,
    #[serde(default = "default_t7_ms")]
    pub t7_ms: u64,
    #[serde(default = "default_t8_ms")]
    pub t8_ms: u64,
    #[serde(default = "default_linktest_ms")]
    pub linktest_interval_ms: u64,
    #[serde(default)]
    pub auto_online: bool,
    #[serde(default = "default_control_state")]
    pub default_control_state: DefaultControlState,
    #[serde(default = "default_establish_comms_timeout_s")]
    pub establish_communications_timeout_s: u64,
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    pub model_name: String,
    pub software_revision: String,
    /// Whether ECID writes (S2F15) survive a restart — the configurable boolean that answers
    /// §9 design note (b).
    #[serde(default)]
    pub persist_ecids: bool,
    #[serde(default)]
    pub mapping_store_path: Option<String>,
    #[serde(default)]
    pub svids: Vec<SvidConfig>,
    #[serde(default)]
    pub ecids: Vec<EcidConfig>,
    #[serde(default)]
    pub alids: Vec<AlidConfig>,
    #[serde(default)]
    pub ceids: Vec<CeidConfig>,
}

fn default_t3_ms() -> u64 {
    45_000
}
fn default_t5_ms() -> u64 {
    10_000
}
fn default_t6_ms() -> u64 {
    5_000
}
fn default_t7_ms() -> u64 {
    10_000
}
fn default_t8_ms() -> u64 {
    5_000
}
fn default_linktest_ms() -> u64 {
    60_000
}
fn default_control_state() -> DefaultControlState {
    DefaultControlState::OnlineRemote
}
fn default_establish_comms_timeout_s() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "device")]
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}
