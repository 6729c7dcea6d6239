use crate::error::TransitionError;

/// The six-phase GEM communication gate (§4.4). Declaration order is the forward order: a
/// `PartialOrd`/`Ord` derive gives us "phase A requires at least phase B" for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    NotConnected,
    HsmsConnected,
    HsmsSelected,
    Communicating,
    Online,
    Initialized,
}

impl Phase {
    fn ordinal(self) -> u8 {
        self as u8
    }

    fn from_ordinal(ord: u8) -> Option<Phase> {
        use Phase::*;
        [
            NotConnected,
            HsmsConnected,
            HsmsSelected,
            Communicating,
            Online,
            Initialized,
        ]
        .get(ord as usize)
        .copied()
    }
}

/// Minimum phase required to admit an inbound primary, per §4.4's admission matrix. Unlisted
/// (stream, function) pairs default to requiring `Online`: nothing else in the catalog of §6
/// does anything useful before the host has put the equipment online (see DESIGN.md).
pub fn min_phase_for(stream: u8, function: u8) -> Phase {
    match (stream, function) {
        (1, 1) | (1, 13) | (1, 15) => Phase::HsmsSelected,
        (1, 17) => Phase::Communicating,
        (5, _) => Phase::Communicating,
        (2, 33) | (2, 35) | (2, 37) | (2, 23) => Phase::Online,
        (6, _) | (7, _) | (10, _) => Phase::Online,
        _ => Phase::Online,
    }
}

/// Owns the per-device phase and enforces strictly-sequential forward motion with
/// arbitrary-backward reset to `NotConnected`.
#[derive(Debug)]
pub struct PhaseGate {
    phase: Phase,
}

impl Default for PhaseGate {
    fn default() -> PhaseGate {
        PhaseGate {
            phase: Phase::NotConnected,
        }
    }
}

impl PhaseGate {
    pub fn new() -> PhaseGate {
        PhaseGate::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advances exactly one step. Returns `PhaseSkipped` if `target` is not `current + 1`.
    pub fn advance(&mut self, target: Phase) -> Result<(), TransitionError> {
        let expected = self.phase.ordinal() + 1;
        if target.ordinal() != expected {
            return Err(TransitionError::PhaseSkipped {
                from_ordinal: self.phase.ordinal(),
                to_ordinal: target.ordinal(),
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Any cause that drops the TCP link: resets unconditionally to `NotConnected`.
    pub fn reset(&mut self) {
        self.phase = Phase::NotConnected;
    }

    pub fn on_hsms_connected(&mut self) -> Result<(), TransitionError> {
        self.advance(Phase::HsmsConnected)
    }

    pub fn on_hsms_selected(&mut self) -> Result<(), TransitionError> {
        self.advance(Phase::HsmsSelected)
    }

    /// `commack`: 0 = accepted (advance), 1 = keep the prior phase.
    pub fn on_comm_established(&mut self, commack: u8) -> Result<(), TransitionError> {
        if commack == 0 {
            self.advance(Phase::Communicating)
        } else {
            Ok(())
        }
    }

    /// `onlack` in {0, 2} advances; anything else keeps the prior phase.
    pub fn on_online_ack(&mut self, onlack: u8) -> Result<(), TransitionError> {
        if onlack == 0 || onlack == 2 {
            self.advance(Phase::Online)
        } else {
            Ok(())
        }
    }

    pub fn on_initialization_complete(&mut self) -> Result<(), TransitionError> {
        self.advance(Phase::Initialized)
    }

    /// True if a primary at `(stream, function)` is admitted in the current phase.
    pub fn permitted(&self, stream: u8, function: u8) -> bool {
        self.phase >= min_phase_for(stream, function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_handshake_reaches_online() {
        let mut gate = PhaseGate::new();
        gate.on_hsms_connected().unwrap();
        gate.on_hsms_selected().unwrap();
        gate.on_comm_established(0).unwrap();
        assert_eq!(gate.phase(), Phase::Communicating);
        gate.on_online_ack(0).unwrap();
        assert_eq!(gate.phase(), Phase::Online);
    }

    #[test]
    fn commack_one_keeps_prior_phase() {
        let mut gate = PhaseGate::new();
        gate.on_hsms_connected().unwrap();
        gate.on_hsms_selected().unwrap();
        gate.on_comm_established(1).unwrap();
        assert_eq!(gate.phase(), Phase::HsmsSelected);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut gate = PhaseGate::new();
        let err = gate.advance(Phase::HsmsSelected).unwrap_err();
        assert!(matches!(err, TransitionError::PhaseSkipped { .. }));
        assert_eq!(gate.phase(), Phase::NotConnected);
    }

    #[test]
    fn link_drop_resets_from_any_phase() {
        let mut gate = PhaseGate::new();
        gate.on_hsms_connected().unwrap();
        gate.on_hsms_selected().unwrap();
        gate.on_comm_established(0).unwrap();
        gate.on_online_ack(0).unwrap();
        gate.reset();
        assert_eq!(gate.phase(), Phase::NotConnected);
    }

    #[test]
    fn admission_matrix_gates_s2f33_below_online() {
        let mut gate = PhaseGate::new();
        gate.on_hsms_connected().unwrap();
        gate.on_hsms_selected().unwrap();
        gate.on_comm_established(0).unwrap();
        assert!(!gate.permitted(2, 33));
        gate.on_online_ack(0).unwrap();
        assert!(gate.permitted(2, 33));
    }

    #[test]
    fn s1f1_permitted_from_hsms_selected_onward() {
        let mut gate = PhaseGate::new();
        gate.on_hsms_connected().unwrap();
        gate.on_hsms_selected().unwrap();
        assert!(gate.permitted(1, 1));
    }

    #[test]
    fn from_ordinal_round_trips() {
        for ord in 0..=5u8 {
            assert_eq!(Phase::from_ordinal(ord).unwrap().ordinal(), ord);
        }
        assert!(Phase::from_ordinal(6).is_none());
    }
}
