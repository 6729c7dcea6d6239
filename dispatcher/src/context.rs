use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use equipment_model::{Registry, ReportEngine};
use gem::{ControlMachine, DefaultControlState, PhaseGate, ProcessMachine};
use secs2::Message;

use crate::events::s6f11_item;

/// Everything a handler needs beyond the message itself: the data model, the report/event and
/// alarm engines, and the three GEM state machines (§4.4–§4.9). Bundled per device, matching
/// the "per-device actor" shape of §5.
pub struct DeviceContext {
    pub device_id: u16,
    pub model_name: String,
    pub software_revision: String,
    pub registry: Registry,
    pub reports: ReportEngine,
    pub phase: Mutex<PhaseGate>,
    pub control: Mutex<ControlMachine>,
    pub process: Mutex<ProcessMachine>,
    /// The configured post-select posture (`OnlineLocal`/`OnlineRemote`) a host-initiated S1F17
    /// or an equipment-initiated auto-online bootstrap lands in, per §4.5 and SPEC_FULL.md §3.1.
    /// Defaults to `OnlineRemote`; `equipment::device::build_context` sets it from the device's
    /// TOML config.
    pub default_control_state: DefaultControlState,
    next_system_bytes: AtomicU32,
    /// Spontaneous equipment-initiated primaries queued by a handler mid-dispatch (e.g. the
    /// `ControlStateChange` S6F11 a control transition fires), per §9 "handlers do not call into
    /// the dispatcher directly" — they queue here and `Dispatcher::drain_pending_events` collects
    /// them for the caller to actually send.
    pending_events: Mutex<Vec<Message>>,
}

impl DeviceContext {
    pub fn new(device_id: u16, model_name: impl Into<String>, software_revision: impl Into<String>) -> DeviceContext {
        DeviceContext {
            device_id,
            model_name: model_name.into(),
            software_revision: software_revision.into(),
            registry: Registry::new(),
            reports: ReportEngine::new(),
            phase: Mutex::new(PhaseGate::new()),
            control: Mutex::new(ControlMachine::new()),
            process: Mutex::new(ProcessMachine::new()),
            default_control_state: DefaultControlState::OnlineRemote,
            next_system_bytes: AtomicU32::new(1),
            pending_events: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the default post-select control posture (builder-style, so existing callers
    /// that don't care keep the `OnlineRemote` default from `new`).
    pub fn with_default_control_state(mut self, default_control_state: DefaultControlState) -> DeviceContext {
        self.default_control_state = default_control_state;
        self
    }

    /// Allocates a fresh system-bytes value for an equipment-initiated primary (§4.8 "Outbound
    /// primaries allocate a fresh system-bytes").
    pub fn next_system_bytes(&self) -> u32 {
        self.next_system_bytes.fetch_add(1, Ordering::Relaxed)
    }

    /// Standard GEM CEID for a control-state transition (SEMI E30's `ControlStateChange`);
    /// named here since several handlers fire it.
    pub const CEID_CONTROL_STATE_CHANGE: u32 = 200;

    /// Reserved SVIDs this implementation carves out for the two alarm-state SVIDs of §3/§4.9:
    /// `AlarmsSet` (every `alid` currently active) and `AlarmsEnabled` (every `alid` currently
    /// enabled). Neither is a per-device configured SVID — `s1f3` special-cases these ids and
    /// answers them from `Registry::alids_active`/`alids_enabled` directly instead of a static
    /// bootstrap table entry, so the value can never drift from the live alarm state.
    pub const SVID_ALARMS_SET: u32 = 201;
    pub const SVID_ALARMS_ENABLED: u32 = 202;

    /// Triggers `ceid`, queuing the resulting `S6F11` for later draining if the CEID is enabled
    /// and linked to at least one report (§4.7, §8 scenario 2).
    pub fn queue_event(&self, ceid: u32) {
        if let Some((dataid, reports)) = self.reports.trigger(&self.registry, ceid) {
            let item = s6f11_item(dataid, ceid, &reports);
            let msg = Message::new(6, 11, self.device_id, self.next_system_bytes())
                .with_reply_expected(true)
                .with_item(item);
            self.pending_events.lock().unwrap().push(msg);
        }
    }

    /// Drains every primary queued by `queue_event` since the last drain.
    pub fn drain_events(&self) -> Vec<Message> {
        std::mem::take(&mut self.pending_events.lock().unwrap())
    }

    /// Cascades a connection loss through the three state machines, per §4.4/§4.8/§7: phase
    /// resets, control drops offline, and an executing process aborts.
    pub fn on_connection_lost(&self) {
        self.phase.lock().unwrap().reset();
        let mut control = self.control.lock().unwrap();
        let _ = control.request_offline(false);
        drop(control);
        let mut process = self.process.lock().unwrap();
        if matches!(
            process.state(),
            gem::ProcessState::Executing | gem::ProcessState::Paused | gem::ProcessState::Completing
        ) {
            let _ = process.abort();
            let _ = process.abort_done();
        }
    }
}
