use crate::error::TransitionError;

/// E30 control-state lattice (§4.5): whether the host has authority (`Online*`) and whether
/// operator local control overrides it (`OnlineLocal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    EquipmentOffline,
    AttemptOnline,
    HostOffline,
    OnlineLocal,
    OnlineRemote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ControlStateChange(ControlState),
    ControlModeChange { is_remote: bool },
}

/// A device's configured post-select posture (§4.5): which of `OnlineLocal`/`OnlineRemote` a
/// successful S1F17/ONLACK exchange or auto-online bootstrap should land in, absent an explicit
/// operator toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultControlState {
    OnlineLocal,
    OnlineRemote,
}

#[derive(Debug)]
pub struct ControlMachine {
    state: ControlState,
}

impl Default for ControlMachine {
    fn default() -> ControlMachine {
        ControlMachine {
            state: ControlState::EquipmentOffline,
        }
    }
}

impl ControlMachine {
    pub fn new() -> ControlMachine {
        ControlMachine::default()
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.state == ControlState::OnlineRemote
    }

    /// Operator or host requests online. Valid from `EquipmentOffline` or `HostOffline` (the
    /// equipment is still online locally from the operator's perspective, only comms dropped);
    /// moves to `AttemptOnline` pending the S1F17/ONLACK exchange the dispatcher drives.
    pub fn request_online(&mut self) -> Result<ControlEvent, TransitionError> {
        if !matches!(self.state, ControlState::EquipmentOffline | ControlState::HostOffline) {
            return Err(TransitionError::InvalidControlTransition);
        }
        self.state = ControlState::AttemptOnline;
        Ok(ControlEvent::ControlStateChange(self.state))
    }

    /// ONLACK arrives for an outstanding `AttemptOnline`. `0` and `2` both land online (local by
    /// default, matching most SECS/GEM equipment default posture); anything else falls back to
    /// offline.
    pub fn on_online_ack(&mut self, onlack: u8) -> Result<ControlEvent, TransitionError> {
        if self.state != ControlState::AttemptOnline {
            return Err(TransitionError::InvalidControlTransition);
        }
        self.state = match onlack {
            0 | 2 => ControlState::OnlineLocal,
            _ => ControlState::EquipmentOffline,
        };
        Ok(ControlEvent::ControlStateChange(self.state))
    }

    /// Host-initiated offline (Remote Command OFFLINE) or operator-initiated: `is_processing`
    /// only affects whether the caller should also abort the active process (decided by the
    /// dispatcher, not this machine) — the control state itself always honors the request.
    pub fn request_offline(&mut self, _is_processing: bool) -> Result<ControlEvent, TransitionError> {
        match self.state {
            ControlState::OnlineLocal | ControlState::OnlineRemote | ControlState::AttemptOnline => {
                self.state = ControlState::EquipmentOffline;
                Ok(ControlEvent::ControlStateChange(self.state))
            }
            ControlState::HostOffline => {
                self.state = ControlState::EquipmentOffline;
                Ok(ControlEvent::ControlStateChange(self.state))
            }
            ControlState::EquipmentOffline => Err(TransitionError::InvalidControlTransition),
        }
    }

    /// The host drops communications (link loss, or explicit Remote Command) while the
    /// equipment remains online locally from the operator's perspective.
    pub fn host_offline(&mut self) -> Result<ControlEvent, TransitionError> {
        if self.state != ControlState::OnlineRemote {
            return Err(TransitionError::InvalidControlTransition);
        }
        self.state = ControlState::HostOffline;
        Ok(ControlEvent::ControlStateChange(self.state))
    }

    /// Operator toggles the local/remote switch. Valid only while online.
    pub fn switch_local_remote(&mut self, to_remote: bool) -> Result<ControlEvent, TransitionError> {
        self.state = match (self.state, to_remote) {
            (ControlState::OnlineLocal, true) => ControlState::OnlineRemote,
            (ControlState::OnlineRemote, false) => ControlState::OnlineLocal,
            (ControlState::OnlineLocal, false) | (ControlState::OnlineRemote, true) => {
                return Ok(ControlEvent::ControlModeChange { is_remote: to_remote })
            }
            _ => return Err(TransitionError::InvalidControlTransition),
        };
        Ok(ControlEvent::ControlModeChange { is_remote: to_remote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_handshake_lands_local() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        assert_eq!(m.state(), ControlState::AttemptOnline);
        m.on_online_ack(0).unwrap();
        assert_eq!(m.state(), ControlState::OnlineLocal);
        assert!(!m.is_remote_enabled());
    }

    #[test]
    fn onlack_rejection_falls_back_offline() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        m.on_online_ack(1).unwrap();
        assert_eq!(m.state(), ControlState::EquipmentOffline);
    }

    #[test]
    fn switch_to_remote_enables_remote_commands() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        m.on_online_ack(0).unwrap();
        m.switch_local_remote(true).unwrap();
        assert_eq!(m.state(), ControlState::OnlineRemote);
        assert!(m.is_remote_enabled());
    }

    #[test]
    fn host_offline_reachable_only_from_online_remote() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        m.on_online_ack(0).unwrap();
        assert!(m.host_offline().is_err());
        m.switch_local_remote(true).unwrap();
        m.host_offline().unwrap();
        assert_eq!(m.state(), ControlState::HostOffline);
    }

    #[test]
    fn request_online_reachable_from_host_offline() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        m.on_online_ack(0).unwrap();
        m.switch_local_remote(true).unwrap();
        m.host_offline().unwrap();
        assert_eq!(m.state(), ControlState::HostOffline);
        m.request_online().unwrap();
        assert_eq!(m.state(), ControlState::AttemptOnline);
    }

    #[test]
    fn offline_request_from_equipment_offline_is_rejected() {
        let mut m = ControlMachine::new();
        assert!(m.request_offline(false).is_err());
    }

    #[test]
    fn offline_request_while_online_returns_to_equipment_offline() {
        let mut m = ControlMachine::new();
        m.request_online().unwrap();
        m.on_online_ack(0).unwrap();
        m.request_offline(false).unwrap();
        assert_eq!(m.state(), ControlState::EquipmentOffline);
    }
}
