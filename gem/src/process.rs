use crate::error::TransitionError;

/// Dicing-tool process state lattice (§4.5). `PartialEq`/`Eq` only — this lattice is not a
/// total order, unlike `Phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Init,
    Idle,
    Setup,
    Ready,
    Executing,
    Paused,
    Completing,
    Aborting,
    Completed,
    Aborted,
}

fn adjacent(from: ProcessState, to: ProcessState) -> bool {
    use ProcessState::*;
    matches!(
        (from, to),
        (Init, Idle)
            | (Idle, Setup)
            | (Setup, Ready)
            | (Setup, Idle)
            | (Ready, Executing)
            | (Ready, Idle)
            | (Executing, Paused)
            | (Executing, Completing)
            | (Paused, Executing)
            | (Completing, Completed)
            | (Completed, Idle)
            | (Aborted, Idle)
            // Abort is reachable from any non-terminal state (`Completed`/`Aborted` excluded).
            | (Init, Aborting)
            | (Idle, Aborting)
            | (Setup, Aborting)
            | (Ready, Aborting)
            | (Executing, Aborting)
            | (Paused, Aborting)
            | (Completing, Aborting)
            | (Aborting, Aborted)
    )
}

#[derive(Debug)]
pub struct ProcessMachine {
    state: ProcessState,
}

impl Default for ProcessMachine {
    fn default() -> ProcessMachine {
        ProcessMachine {
            state: ProcessState::Init,
        }
    }
}

impl ProcessMachine {
    pub fn new() -> ProcessMachine {
        ProcessMachine::default()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    fn transition(&mut self, to: ProcessState) -> Result<(), TransitionError> {
        if adjacent(self.state, to) {
            self.state = to;
            Ok(())
        } else {
            Err(TransitionError::InvalidProcessTransition(self.state, to))
        }
    }

    pub fn initialized(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Idle)
    }

    pub fn begin_setup(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Setup)
    }

    pub fn setup_complete(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Ready)
    }

    pub fn cancel_setup(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Idle)
    }

    /// Requires `RemoteEnabled` and GEM phase `Initialized`, per §4.5's Start gate; the caller
    /// (the dispatcher) supplies both because this machine does not know about control state or
    /// GEM phase.
    pub fn start(&mut self, is_remote_enabled: bool, is_gem_initialized: bool) -> Result<(), TransitionError> {
        if !is_remote_enabled || !is_gem_initialized {
            return Err(TransitionError::StartNotPermitted);
        }
        self.transition(ProcessState::Executing)
    }

    pub fn cancel_ready(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Idle)
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Paused)
    }

    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Executing)
    }

    pub fn finish(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Completing)
    }

    pub fn completing_done(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Completed)
    }

    /// Abort is reachable from `Executing`, `Paused`, or `Completing`.
    pub fn abort(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Aborting)
    }

    pub fn abort_done(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Aborted)
    }

    /// Returns to `Idle` from either terminal state, ready for the next run.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.transition(ProcessState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_init_to_completed() {
        let mut m = ProcessMachine::new();
        m.initialized().unwrap();
        m.begin_setup().unwrap();
        m.setup_complete().unwrap();
        m.start(true, true).unwrap();
        assert_eq!(m.state(), ProcessState::Executing);
        m.finish().unwrap();
        m.completing_done().unwrap();
        assert_eq!(m.state(), ProcessState::Completed);
        m.reset().unwrap();
        assert_eq!(m.state(), ProcessState::Idle);
    }

    #[test]
    fn start_without_remote_enabled_is_rejected() {
        let mut m = ProcessMachine::new();
        m.initialized().unwrap();
        m.begin_setup().unwrap();
        m.setup_complete().unwrap();
        let err = m.start(false, true).unwrap_err();
        assert!(matches!(err, TransitionError::StartNotPermitted));
        assert_eq!(m.state(), ProcessState::Ready);
    }

    #[test]
    fn pause_resume_round_trip() {
        let mut m = ProcessMachine::new();
        m.initialized().unwrap();
        m.begin_setup().unwrap();
        m.setup_complete().unwrap();
        m.start(true, true).unwrap();
        m.pause().unwrap();
        assert_eq!(m.state(), ProcessState::Paused);
        m.resume().unwrap();
        assert_eq!(m.state(), ProcessState::Executing);
    }

    #[test]
    fn abort_reachable_from_paused() {
        let mut m = ProcessMachine::new();
        m.initialized().unwrap();
        m.begin_setup().unwrap();
        m.setup_complete().unwrap();
        m.start(true, true).unwrap();
        m.pause().unwrap();
        m.abort().unwrap();
        m.abort_done().unwrap();
        assert_eq!(m.state(), ProcessState::Aborted);
        m.reset().unwrap();
        assert_eq!(m.state(), ProcessState::Idle);
    }

    #[test]
    fn abort_reachable_from_every_non_terminal_state() {
        for state in [
            ProcessState::Init,
            ProcessState::Idle,
            ProcessState::Setup,
            ProcessState::Ready,
            ProcessState::Executing,
            ProcessState::Paused,
            ProcessState::Completing,
        ] {
            assert!(adjacent(state, ProcessState::Aborting), "{state:?} should reach Aborting");
        }
        assert!(!adjacent(ProcessState::Completed, ProcessState::Aborting));
        assert!(!adjacent(ProcessState::Aborted, ProcessState::Aborting));
    }

    #[test]
    fn abort_reachable_from_idle() {
        let mut m = ProcessMachine::new();
        m.initialized().unwrap();
        assert_eq!(m.state(), ProcessState::Idle);
        m.abort().unwrap();
        m.abort_done().unwrap();
        assert_eq!(m.state(), ProcessState::Aborted);
    }

    #[test]
    fn non_adjacent_transition_is_rejected() {
        let mut m = ProcessMachine::new();
        let err = m.start(true, true).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidProcessTransition(ProcessState::Init, ProcessState::Executing)));
        assert_eq!(m.state(), ProcessState::Init);
    }
}
