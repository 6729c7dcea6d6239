/// The connection-level state machine of SEMI E37: `NotConnected`, `Connected` (TCP up, not yet
/// selected), `Selected`. This is the pure transition logic only — no sockets, no timers — so it
/// can be exhaustively unit tested; the `equipment` binary drives it from the real I/O loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotConnected,
    Connected,
    Selected,
}

/// Events the connection machine emits upward to the GEM phase gate, per §4.3's "exposes an
/// async event stream `{Connected, Selected, Deselected, Disconnected}`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Selected,
    Deselected,
    Disconnected,
}

/// Outcome of receiving a Select.req: the status to reply with, and whether the machine moved
/// into `Selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOutcome {
    pub status: u8,
    pub event: Option<ConnectionEvent>,
}

/// Outcome of receiving a Deselect.req: the status to reply with, and whether the machine
/// dropped back to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeselectOutcome {
    pub status: u8,
    pub event: Option<ConnectionEvent>,
}

#[derive(Debug, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
}

impl Default for ConnectionState {
    fn default() -> ConnectionState {
        ConnectionState::NotConnected
    }
}

impl ConnectionMachine {
    pub fn new() -> ConnectionMachine {
        ConnectionMachine {
            state: ConnectionState::NotConnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// TCP accepted (passive) or connected (active).
    pub fn on_tcp_up(&mut self) -> ConnectionEvent {
        self.state = ConnectionState::Connected;
        ConnectionEvent::Connected
    }

    /// A Select.req arrived. `already_selected_elsewhere` models "already Selected from another
    /// session on same socket" (always false in this single-host design, kept for fidelity to
    /// the spec's documented branch).
    pub fn on_select_req(&mut self, already_selected_elsewhere: bool) -> SelectOutcome {
        match self.state {
            ConnectionState::Connected if !already_selected_elsewhere => {
                self.state = ConnectionState::Selected;
                SelectOutcome {
                    status: 0,
                    event: Some(ConnectionEvent::Selected),
                }
            }
            ConnectionState::Connected | ConnectionState::Selected => SelectOutcome {
                status: 1,
                event: None,
            },
            ConnectionState::NotConnected => SelectOutcome {
                status: 1,
                event: None,
            },
        }
    }

    /// A Deselect.req arrived. `has_outstanding_transactions` gates acceptance per §4.3.
    pub fn on_deselect_req(&mut self, has_outstanding_transactions: bool) -> DeselectOutcome {
        if self.state != ConnectionState::Selected {
            return DeselectOutcome {
                status: 1,
                event: None,
            };
        }
        if has_outstanding_transactions {
            DeselectOutcome {
                status: 1,
                event: None,
            }
        } else {
            self.state = ConnectionState::Connected;
            DeselectOutcome {
                status: 0,
                event: Some(ConnectionEvent::Deselected),
            }
        }
    }

    /// We sent Select.req (active role) and this is the host's Select.rsp. Accepted (moves to
    /// `Selected`) only from `Connected` with a `0` status; anything else leaves the state
    /// unchanged and returns `None` for the caller to treat as a failed handshake.
    pub fn on_select_rsp(&mut self, status: u8) -> Option<ConnectionEvent> {
        if self.state == ConnectionState::Connected && status == 0 {
            self.state = ConnectionState::Selected;
            Some(ConnectionEvent::Selected)
        } else {
            None
        }
    }

    /// Separate.req, TCP close, or T7 expiry: immediate drop to `NotConnected`.
    pub fn on_disconnect(&mut self) -> ConnectionEvent {
        self.state = ConnectionState::NotConnected;
        ConnectionEvent::Disconnected
    }

    pub fn is_selected(&self) -> bool {
        self.state == ConnectionState::Selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_reaches_selected() {
        let mut m = ConnectionMachine::new();
        assert_eq!(m.on_tcp_up(), ConnectionEvent::Connected);
        assert_eq!(m.state(), ConnectionState::Connected);
        let outcome = m.on_select_req(false);
        assert_eq!(outcome.status, 0);
        assert_eq!(outcome.event, Some(ConnectionEvent::Selected));
        assert_eq!(m.state(), ConnectionState::Selected);
    }

    #[test]
    fn duplicate_select_is_rejected_without_changing_state() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        m.on_select_req(false);
        let second = m.on_select_req(false);
        assert_eq!(second.status, 1);
        assert_eq!(second.event, None);
        assert_eq!(m.state(), ConnectionState::Selected);
    }

    #[test]
    fn deselect_with_outstanding_transactions_is_rejected() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        m.on_select_req(false);
        let outcome = m.on_deselect_req(true);
        assert_eq!(outcome.status, 1);
        assert_eq!(m.state(), ConnectionState::Selected);
    }

    #[test]
    fn deselect_without_outstanding_transactions_succeeds() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        m.on_select_req(false);
        let outcome = m.on_deselect_req(false);
        assert_eq!(outcome.status, 0);
        assert_eq!(outcome.event, Some(ConnectionEvent::Deselected));
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn select_rsp_accepted_moves_to_selected() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        let event = m.on_select_rsp(0);
        assert_eq!(event, Some(ConnectionEvent::Selected));
        assert_eq!(m.state(), ConnectionState::Selected);
    }

    #[test]
    fn select_rsp_rejected_status_stays_connected() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        let event = m.on_select_rsp(1);
        assert_eq!(event, None);
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn disconnect_from_any_state_reaches_not_connected() {
        let mut m = ConnectionMachine::new();
        m.on_tcp_up();
        m.on_select_req(false);
        assert_eq!(m.on_disconnect(), ConnectionEvent::Disconnected);
        assert_eq!(m.state(), ConnectionState::NotConnected);
    }
}
